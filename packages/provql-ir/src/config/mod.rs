//! Compiler configuration
//!
//! Three tiers, most users only need the first:
//! - Level 1: Preset - one-liner
//! - Level 2: Section override - closures over a preset
//! - Level 3: YAML file and `PROVQL__*` environment variables
//!
//! # Examples
//!
//! ```rust,ignore
//! use provql_ir::config::{CompilerConfig, Preset};
//!
//! let config = CompilerConfig::preset(Preset::Strict).build()?;
//!
//! let config = CompilerConfig::preset(Preset::Balanced)
//!     .limits(|l| l.max_tokens(1_000))
//!     .build()?;
//!
//! let config = CompilerConfig::load_yaml("provql.yaml")?.apply_env()?.build()?;
//! ```
//!
//! Every overridden field records where it came from (`ConfigProvenance`).

pub mod compiler_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod provenance;

pub use compiler_config::{
    CatalogConfig, CompilerConfig, LimitsConfig, OutputConfig, ValidatedConfig,
    VerificationConfig, VerificationMode, ENV_PREFIX,
};
pub use error::{ConfigError, ConfigResult};
pub use io::{
    CatalogPatch, ConfigExportV1, ConfigOverrides, LimitsPatch, OutputPatch, VerificationPatch,
};
pub use preset::Preset;
pub use provenance::{ConfigProvenance, ConfigSource};
