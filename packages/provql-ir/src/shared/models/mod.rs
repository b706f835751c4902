//! Shared models
//!
//! Pure data used by every stage. Nothing here performs I/O except the YAML
//! loader on `Schema`.

mod permission;
mod provenance;
pub mod refinement;
mod schema;
mod span;
mod type_expr;
mod typed_value;
mod value;

pub use permission::{PermissionProfile, ValidationLevel};
pub use provenance::{ProvenanceClock, ProvenanceError, ProvenanceRecord};
pub use refinement::{decide, Decision};
pub use schema::{ColumnDef, NormalForm, Schema, SchemaError};
pub use span::{Position, Span};
pub use type_expr::{format_float, TypeCategory, TypeExpr};
pub use typed_value::{RefinementError, TypedValue};
pub use value::{rfc3339_to_timestamp, timestamp_to_rfc3339, PromptScores, Value};
