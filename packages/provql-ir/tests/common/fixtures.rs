//! Test fixtures
//!
//! The `evidence` table used across the integration tests, plus roles and
//! YAML documents for the catalog and config loaders.

use provql_ir::shared::models::{ColumnDef, NormalForm, TypeCategory};
use provql_ir::{PermissionProfile, Schema, TypeExpr};

/// Evidence table covering every refinement category
pub fn evidence_schema() -> Schema {
    Schema::new(
        "evidence",
        vec![
            ColumnDef::new("id", TypeExpr::Uuid).primary_key(),
            ColumnDef::new("title", TypeExpr::NonEmptyString),
            ColumnDef::new("prompt_provenance", TypeExpr::bounded_nat(0, 100)),
            ColumnDef::new("score", TypeExpr::Nat),
            ColumnDef::new("confidence", TypeExpr::Confidence),
            ColumnDef::new("scores", TypeExpr::PromptScores),
            ColumnDef::new("note", TypeExpr::String),
        ],
    )
    .unwrap()
    .with_normal_form(NormalForm::Third)
}

/// Same table as YAML, as the CLI and catalog loader read it
pub const EVIDENCE_SCHEMA_YAML: &str = r#"
name: evidence
columns:
  - name: id
    type: Uuid
    primary_key: true
  - name: title
    type: NonEmptyString
  - name: prompt_provenance
    type: BoundedNat(0, 100)
  - name: score
    type: Nat
  - name: confidence
    type: Confidence
  - name: note
    type: String
"#;

pub const PROFILES_YAML: &str = r#"
- role_id: analyst
  type_whitelist: [String, NonEmptyString, BoundedNat, Nat, Confidence]
  validation_level: strict
- role_id: writer
  type_whitelist: [String]
  validation_level: standard
"#;

pub fn admin() -> PermissionProfile {
    PermissionProfile::unrestricted("admin")
}

/// Role that may only touch plain strings
pub fn string_only(role: &str) -> PermissionProfile {
    PermissionProfile::new(role, [TypeCategory::String])
}
