/*
 * ProvQL IR - compiler for a provenance-aware query language
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (Position, TypeExpr, TypedValue, Schema, PermissionProfile)
 * - features/    : Vertical slices (lexing → parsing → type_checking → ir_generation
 *                  → permission → serialization), plus smt, catalog and execution
 * - pipeline/    : Fail-fast state machine, sync orchestrator, async service
 * - config/      : Presets, YAML / env overrides
 *
 * Compilation never performs storage I/O; the execution engine is a port the
 * caller drives with the compiled IR.
 */

#![allow(clippy::should_implement_trait)] // Preset::from_str mirrors the FromStr name

/// Shared models and utilities
pub mod shared;

/// Feature modules (one per compile stage plus collaborators)
pub mod features;

/// Pipeline orchestration
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{CompilerConfig, Preset, ValidatedConfig};
pub use errors::{ProvqlError, Result};
pub use features::catalog::{PermissionStore, SchemaRegistry, SnapshotCatalog};
pub use features::execution::{ExecutionEngine, InMemoryEngine, RowResult};
pub use features::ir_generation::{IRNode, ProofBlob};
pub use features::serialization::{Encoded, Format, Serializer};
pub use pipeline::{
    CompileOutput, CompilePipeline, CompileRequest, CompileService, PipelineError,
    PipelineErrorKind, PipelineState,
};
pub use shared::models::{
    PermissionProfile, ProvenanceRecord, Schema, TypeExpr, TypedValue, Value,
};

/// Compile one statement with the default configuration
///
/// ```rust,ignore
/// let output = provql_ir::compile(
///     "SELECT * FROM evidence WHERE id = 1",
///     &schema,
///     &PermissionProfile::unrestricted("analyst"),
/// )?;
/// ```
pub fn compile(
    source: &str,
    schema: &Schema,
    profile: &PermissionProfile,
) -> std::result::Result<CompileOutput, PipelineError> {
    CompilePipeline::default().compile(
        &CompileRequest::new(source, profile.role_id.clone()),
        schema,
        profile,
    )
}
