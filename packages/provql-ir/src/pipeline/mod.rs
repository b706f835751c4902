//! Compile pipeline
//!
//! ```text
//! Idle → Tokenizing → Parsing → TypeChecking → IRGenerating
//!      → PermissionValidating → Serializing → Done
//!                     (any non-terminal) → Error
//! ```
//!
//! - `orchestrator`: synchronous, fail-fast `CompilePipeline`
//! - `service`: async `CompileService` with catalog lookups, timeout and cancellation
//! - `state`: the state machine and its trace
//! - `error`: `PipelineError` and stage error conversions

pub mod error;
pub mod orchestrator;
pub mod service;
pub mod state;

pub use error::{PipelineError, PipelineErrorKind, PipelineResult};
pub use orchestrator::{CompileOutput, CompilePipeline, CompileRequest};
pub use service::CompileService;
pub use state::{IllegalTransition, PipelineState, StageTiming, StateMachine};
