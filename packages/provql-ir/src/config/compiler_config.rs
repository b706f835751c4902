//! Compiler configuration (builder)
//!
//! Preset → overrides (closures, YAML patches, env vars) → `build()`.
//! `build()` is the only way to obtain a `ValidatedConfig`, so everything
//! downstream can rely on the ranges checked there.

use super::error::{ConfigError, ConfigResult};
use super::io::{
    CatalogPatch, ConfigExportV1, ConfigOverrides, LimitsPatch, OutputPatch, VerificationPatch,
};
use super::preset::Preset;
use super::provenance::{ConfigProvenance, ConfigSource};
use crate::features::serialization::Format;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Prefix of environment overrides: `PROVQL__<SECTION>__<FIELD>`
pub const ENV_PREFIX: &str = "PROVQL__";

const SECTIONS: [&str; 4] = ["limits", "verification", "output", "catalog"];
const LIMITS_FIELDS: [&str; 3] = ["max_source_bytes", "max_tokens", "max_statement_depth"];
const VERIFICATION_FIELDS: [&str; 2] = ["mode", "proof_cache_capacity"];
const OUTPUT_FIELDS: [&str; 1] = ["format"];
const CATALOG_FIELDS: [&str; 1] = ["lookup_timeout_ms"];

/// How refinements are established during type checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Interval verifier first, runtime predicate when it is undecided
    #[default]
    StaticThenRuntime,
    /// Skip the static stage
    RuntimeOnly,
}

impl VerificationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticThenRuntime => "static_then_runtime",
            Self::RuntimeOnly => "runtime_only",
        }
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static_then_runtime" => Ok(Self::StaticThenRuntime),
            "runtime_only" => Ok(Self::RuntimeOnly),
            _ => Err(format!(
                "unknown verification mode '{}' (expected static_then_runtime or runtime_only)",
                s
            )),
        }
    }
}

/// Input size limits enforced before and during parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum statement length in bytes (1..=16 MiB)
    pub max_source_bytes: usize,

    /// Maximum token count (1..=1_000_000)
    pub max_tokens: usize,

    /// Maximum expression nesting depth (1..=1024)
    pub max_statement_depth: usize,
}

impl LimitsConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Strict => Self {
                max_source_bytes: 16 * 1024,
                max_tokens: 2_048,
                max_statement_depth: 32,
            },
            Preset::Balanced => Self {
                max_source_bytes: 64 * 1024,
                max_tokens: 8_192,
                max_statement_depth: 64,
            },
            Preset::Permissive => Self {
                max_source_bytes: 1024 * 1024,
                max_tokens: 65_536,
                max_statement_depth: 128,
            },
        }
    }

    pub fn max_source_bytes(mut self, v: usize) -> Self {
        self.max_source_bytes = v;
        self
    }

    pub fn max_tokens(mut self, v: usize) -> Self {
        self.max_tokens = v;
        self
    }

    pub fn max_statement_depth(mut self, v: usize) -> Self {
        self.max_statement_depth = v;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_range(
            "limits.max_source_bytes",
            self.max_source_bytes,
            1,
            16 * 1024 * 1024,
            "A statement must be allowed at least one byte and at most 16 MiB",
        )?;
        check_range(
            "limits.max_tokens",
            self.max_tokens,
            1,
            1_000_000,
            "A statement needs at least one token",
        )?;
        check_range(
            "limits.max_statement_depth",
            self.max_statement_depth,
            1,
            1024,
            "Deep nesting is bounded to keep the recursive-descent parser off the stack limit",
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub mode: VerificationMode,

    /// Proof cache entries; 0 disables caching (0..=1_000_000)
    pub proof_cache_capacity: usize,
}

impl VerificationConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Strict => Self {
                mode: VerificationMode::StaticThenRuntime,
                proof_cache_capacity: 256,
            },
            Preset::Balanced => Self {
                mode: VerificationMode::StaticThenRuntime,
                proof_cache_capacity: 1_024,
            },
            Preset::Permissive => Self {
                mode: VerificationMode::RuntimeOnly,
                proof_cache_capacity: 4_096,
            },
        }
    }

    pub fn mode(mut self, v: VerificationMode) -> Self {
        self.mode = v;
        self
    }

    pub fn proof_cache_capacity(mut self, v: usize) -> Self {
        self.proof_cache_capacity = v;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_range(
            "verification.proof_cache_capacity",
            self.proof_cache_capacity,
            0,
            1_000_000,
            "Use 0 to disable the proof cache",
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Format,
}

impl OutputConfig {
    pub fn from_preset(_preset: Preset) -> Self {
        Self::default()
    }

    pub fn format(mut self, v: Format) -> Self {
        self.format = v;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Schema lookup timeout (1..=60_000 ms)
    pub lookup_timeout_ms: u64,
}

impl CatalogConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let lookup_timeout_ms = match preset {
            Preset::Strict => 250,
            Preset::Balanced => 1_000,
            Preset::Permissive => 5_000,
        };
        Self { lookup_timeout_ms }
    }

    pub fn lookup_timeout_ms(mut self, v: u64) -> Self {
        self.lookup_timeout_ms = v;
        self
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_range(
            "catalog.lookup_timeout_ms",
            self.lookup_timeout_ms,
            1,
            60_000,
            "A zero timeout would fail every lookup",
        )
    }
}

fn check_range<T>(field: &str, value: T, min: T, max: T, hint: &str) -> ConfigResult<()>
where
    T: PartialOrd + fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::range_with_hint(field, value, min, max, hint));
    }
    Ok(())
}

/// Compiler configuration (builder)
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    pub(crate) preset: Preset,
    pub(crate) limits: LimitsConfig,
    pub(crate) verification: VerificationConfig,
    pub(crate) output: OutputConfig,
    pub(crate) catalog: CatalogConfig,
    pub(crate) provenance: ConfigProvenance,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

impl CompilerConfig {
    /// Level 1: create from preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            limits: LimitsConfig::from_preset(preset),
            verification: VerificationConfig::from_preset(preset),
            output: OutputConfig::from_preset(preset),
            catalog: CatalogConfig::from_preset(preset),
            provenance: ConfigProvenance::from_preset(preset),
        }
    }

    /// Level 2: override limits
    pub fn limits<F>(mut self, f: F) -> Self
    where
        F: FnOnce(LimitsConfig) -> LimitsConfig,
    {
        self.limits = f(self.limits);
        self.provenance.track_field("limits.*", ConfigSource::Builder);
        self
    }

    pub fn verification<F>(mut self, f: F) -> Self
    where
        F: FnOnce(VerificationConfig) -> VerificationConfig,
    {
        self.verification = f(self.verification);
        self.provenance
            .track_field("verification.*", ConfigSource::Builder);
        self
    }

    pub fn output<F>(mut self, f: F) -> Self
    where
        F: FnOnce(OutputConfig) -> OutputConfig,
    {
        self.output = f(self.output);
        self.provenance.track_field("output.*", ConfigSource::Builder);
        self
    }

    pub fn catalog<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CatalogConfig) -> CatalogConfig,
    {
        self.catalog = f(self.catalog);
        self.provenance.track_field("catalog.*", ConfigSource::Builder);
        self
    }

    pub fn get_preset(&self) -> Preset {
        self.preset
    }

    pub fn provenance(&self) -> &ConfigProvenance {
        &self.provenance
    }

    /// Validate every section
    pub fn build(self) -> ConfigResult<ValidatedConfig> {
        self.limits.validate()?;
        self.verification.validate()?;
        self.catalog.validate()?;
        debug!(preset = %self.preset, "configuration validated");
        Ok(ValidatedConfig(self))
    }

    /// Level 3: load and validate a YAML file (v1 schema)
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<ValidatedConfig> {
        Self::load_yaml(path)?.build()
    }

    /// Load a YAML file without validating, so env overrides can still be layered on
    pub fn load_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Parse YAML text; `origin` is recorded as the provenance of every override
    pub fn from_yaml_str(content: &str, origin: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        if export.version != 1 {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: vec![1],
            });
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;

        let mut config = Self::preset(preset);
        if let Some(overrides) = export.overrides {
            config.apply_overrides(
                overrides,
                &ConfigSource::Yaml {
                    path: origin.to_string(),
                },
            );
        }
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides, source: &ConfigSource) {
        if let Some(limits) = overrides.limits {
            if let Some(v) = limits.max_source_bytes {
                self.limits.max_source_bytes = v;
                self.provenance
                    .track_field("limits.max_source_bytes", source.clone());
            }
            if let Some(v) = limits.max_tokens {
                self.limits.max_tokens = v;
                self.provenance.track_field("limits.max_tokens", source.clone());
            }
            if let Some(v) = limits.max_statement_depth {
                self.limits.max_statement_depth = v;
                self.provenance
                    .track_field("limits.max_statement_depth", source.clone());
            }
        }
        if let Some(verification) = overrides.verification {
            if let Some(v) = verification.mode {
                self.verification.mode = v;
                self.provenance.track_field("verification.mode", source.clone());
            }
            if let Some(v) = verification.proof_cache_capacity {
                self.verification.proof_cache_capacity = v;
                self.provenance
                    .track_field("verification.proof_cache_capacity", source.clone());
            }
        }
        if let Some(output) = overrides.output {
            if let Some(v) = output.format {
                self.output.format = v;
                self.provenance.track_field("output.format", source.clone());
            }
        }
        if let Some(catalog) = overrides.catalog {
            if let Some(v) = catalog.lookup_timeout_ms {
                self.catalog.lookup_timeout_ms = v;
                self.provenance
                    .track_field("catalog.lookup_timeout_ms", source.clone());
            }
        }
    }

    /// Apply `PROVQL__<SECTION>__<FIELD>` variables from the process environment
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_env_from(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs; names without the prefix are ignored
    pub fn apply_env_from<I, K, V>(mut self, vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut vars: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(k, _)| k.as_ref().starts_with(ENV_PREFIX))
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        // Deterministic order when the same field appears twice
        vars.sort();

        for (name, value) in vars {
            let key = name[ENV_PREFIX.len()..].to_lowercase();
            let (section, field) = key.split_once("__").unwrap_or((key.as_str(), ""));
            let patch = env_patch(section, field, value.trim())?;
            self.apply_overrides(patch, &ConfigSource::Env(name.clone()));
        }
        Ok(self)
    }

    /// Export to YAML with every effective value as an override
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: self.preset.to_string(),
            overrides: Some(ConfigOverrides {
                limits: Some(LimitsPatch {
                    max_source_bytes: Some(self.limits.max_source_bytes),
                    max_tokens: Some(self.limits.max_tokens),
                    max_statement_depth: Some(self.limits.max_statement_depth),
                }),
                verification: Some(VerificationPatch {
                    mode: Some(self.verification.mode),
                    proof_cache_capacity: Some(self.verification.proof_cache_capacity),
                }),
                output: Some(OutputPatch {
                    format: Some(self.output.format),
                }),
                catalog: Some(CatalogPatch {
                    lookup_timeout_ms: Some(self.catalog.lookup_timeout_ms),
                }),
            }),
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} [verification={}, format={}, max_tokens={}, lookup_timeout={}ms]",
            self.preset,
            self.verification.mode,
            self.output.format,
            self.limits.max_tokens,
            self.catalog.lookup_timeout_ms
        )
    }
}

fn env_patch(section: &str, field: &str, value: &str) -> ConfigResult<ConfigOverrides> {
    let path = format!("{}.{}", section, field);
    let mut patch = ConfigOverrides::default();
    match section {
        "limits" => {
            let mut limits = LimitsPatch::default();
            match field {
                "max_source_bytes" => limits.max_source_bytes = Some(parse_env(&path, value)?),
                "max_tokens" => limits.max_tokens = Some(parse_env(&path, value)?),
                "max_statement_depth" => {
                    limits.max_statement_depth = Some(parse_env(&path, value)?)
                }
                _ => {
                    return Err(ConfigError::unknown_field_with_suggestion(
                        field,
                        section,
                        &LIMITS_FIELDS,
                    ))
                }
            }
            patch.limits = Some(limits);
        }
        "verification" => {
            let mut verification = VerificationPatch::default();
            match field {
                "mode" => verification.mode = Some(parse_env(&path, value)?),
                "proof_cache_capacity" => {
                    verification.proof_cache_capacity = Some(parse_env(&path, value)?)
                }
                _ => {
                    return Err(ConfigError::unknown_field_with_suggestion(
                        field,
                        section,
                        &VERIFICATION_FIELDS,
                    ))
                }
            }
            patch.verification = Some(verification);
        }
        "output" => match field {
            "format" => {
                patch.output = Some(OutputPatch {
                    format: Some(parse_env(&path, value)?),
                })
            }
            _ => {
                return Err(ConfigError::unknown_field_with_suggestion(
                    field,
                    section,
                    &OUTPUT_FIELDS,
                ))
            }
        },
        "catalog" => match field {
            "lookup_timeout_ms" => {
                patch.catalog = Some(CatalogPatch {
                    lookup_timeout_ms: Some(parse_env(&path, value)?),
                })
            }
            _ => {
                return Err(ConfigError::unknown_field_with_suggestion(
                    field,
                    section,
                    &CATALOG_FIELDS,
                ))
            }
        },
        _ => {
            return Err(ConfigError::unknown_field_with_suggestion(
                section, "config", &SECTIONS,
            ))
        }
    }
    Ok(patch)
}

fn parse_env<T>(field: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::invalid_value(field, value, e.to_string()))
}

/// Configuration that passed `build()`
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig(CompilerConfig);

impl Default for ValidatedConfig {
    /// Preset values are always within range
    fn default() -> Self {
        Self(CompilerConfig::default())
    }
}

impl ValidatedConfig {
    pub fn into_inner(self) -> CompilerConfig {
        self.0
    }

    pub fn as_inner(&self) -> &CompilerConfig {
        &self.0
    }

    pub fn preset(&self) -> Preset {
        self.0.preset
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.0.limits
    }

    pub fn verification(&self) -> &VerificationConfig {
        &self.0.verification
    }

    pub fn output(&self) -> &OutputConfig {
        &self.0.output
    }

    pub fn catalog(&self) -> &CatalogConfig {
        &self.0.catalog
    }

    pub fn provenance(&self) -> &ConfigProvenance {
        &self.0.provenance
    }

    pub fn describe(&self) -> String {
        self.0.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_every_preset_is_valid() {
        for preset in Preset::ALL {
            assert!(CompilerConfig::preset(preset).build().is_ok(), "{}", preset);
        }
        assert_eq!(
            ValidatedConfig::default(),
            CompilerConfig::default().build().unwrap()
        );
    }

    #[test]
    fn test_builder_override_tracks_provenance() {
        let config = CompilerConfig::preset(Preset::Strict)
            .limits(|l| l.max_tokens(100))
            .output(|o| o.format(Format::Json))
            .build()
            .unwrap();
        assert_eq!(config.limits().max_tokens, 100);
        assert_eq!(config.limits().max_source_bytes, 16 * 1024);
        assert_eq!(config.output().format, Format::Json);
        assert_eq!(
            config.provenance().get_source("limits.*"),
            Some(&ConfigSource::Builder)
        );
    }

    #[test]
    fn test_build_rejects_out_of_range() {
        let err = CompilerConfig::preset(Preset::Balanced)
            .catalog(|c| c.lookup_timeout_ms(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Range { ref field, .. } if field == "catalog.lookup_timeout_ms"));

        let err = CompilerConfig::preset(Preset::Balanced)
            .limits(|l| l.max_statement_depth(5000))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("5000 not in 1..=1024"));
    }

    #[test]
    fn test_yaml_overrides_keep_unmentioned_preset_values() {
        let yaml = "version: 1\npreset: strict\noverrides:\n  limits:\n    max_tokens: 99\n";
        let config = CompilerConfig::from_yaml_str(yaml, "inline.yaml").unwrap();
        assert_eq!(config.limits.max_tokens, 99);
        assert_eq!(config.limits.max_statement_depth, 32);
        assert_eq!(
            config.provenance().source_of("limits.max_tokens"),
            ConfigSource::Yaml {
                path: "inline.yaml".into()
            }
        );
    }

    #[test]
    fn test_yaml_version_and_preset_errors() {
        let err = CompilerConfig::from_yaml_str("version: 2\npreset: strict\n", "x").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 2, .. }));

        let err = CompilerConfig::from_yaml_str("version: 1\npreset: turbo\n", "x").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(ref p) if p == "turbo"));

        let err = CompilerConfig::from_yaml_str("preset: strict\n", "x").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "version: 1\npreset: permissive\noverrides:\n  output:\n    format: packed"
        )
        .unwrap();
        let config = CompilerConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.preset(), Preset::Permissive);
        assert_eq!(config.output().format, Format::Packed);
        assert_eq!(config.verification().mode, VerificationMode::RuntimeOnly);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = CompilerConfig::preset(Preset::Strict)
            .verification(|v| v.mode(VerificationMode::RuntimeOnly).proof_cache_capacity(0));
        let yaml = config.to_yaml().unwrap();
        let reloaded = CompilerConfig::from_yaml_str(&yaml, "export.yaml").unwrap();
        assert_eq!(reloaded.limits, config.limits);
        assert_eq!(reloaded.verification, config.verification);
        assert_eq!(reloaded.output, config.output);
        assert_eq!(reloaded.catalog, config.catalog);
    }

    #[test]
    fn test_env_overrides() {
        let config = CompilerConfig::preset(Preset::Balanced)
            .apply_env_from([
                ("PROVQL__LIMITS__MAX_TOKENS", "42"),
                ("PROVQL__VERIFICATION__MODE", "runtime_only"),
                ("PROVQL__OUTPUT__FORMAT", "SQL"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.limits.max_tokens, 42);
        assert_eq!(config.verification.mode, VerificationMode::RuntimeOnly);
        assert_eq!(config.output.format, Format::Sql);
        assert_eq!(
            config.provenance().source_of("limits.max_tokens").describe(),
            "env:PROVQL__LIMITS__MAX_TOKENS"
        );
    }

    #[test]
    fn test_env_errors() {
        let err = CompilerConfig::default()
            .apply_env_from([("PROVQL__LIMITS__MAX_TOKNS", "1")])
            .unwrap_err();
        assert!(err.to_string().contains("Did you mean 'max_tokens'?"));

        let err = CompilerConfig::default()
            .apply_env_from([("PROVQL__LIMITS__MAX_TOKENS", "lots")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "limits.max_tokens"));

        let err = CompilerConfig::default()
            .apply_env_from([("PROVQL__CATALOGUE__LOOKUP_TIMEOUT_MS", "1")])
            .unwrap_err();
        assert!(err.to_string().contains("Did you mean 'catalog'?"));
    }

    #[test]
    fn test_describe() {
        let config = CompilerConfig::preset(Preset::Strict).build().unwrap();
        assert_eq!(
            config.describe(),
            "strict [verification=static_then_runtime, format=cbor, max_tokens=2048, lookup_timeout=250ms]"
        );
    }
}
