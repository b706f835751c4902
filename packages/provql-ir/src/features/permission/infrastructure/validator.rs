//! Permission validator
//!
//! Runs on IR, after lowering: the categories it gates on are those of the
//! resolved column types, not of whatever a statement declared.

use crate::features::ir_generation::IRNode;
use crate::features::permission::domain::PermissionError;
use crate::features::type_checking::Dialect;
use crate::shared::models::{PermissionProfile, ValidationLevel};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionValidator;

impl PermissionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Fail on the first column the profile does not allow
    pub fn validate(&self, node: &IRNode, profile: &PermissionProfile) -> Result<(), PermissionError> {
        for row in &node.rows {
            let category = row.value.ty().category();
            if !profile.allows(category) {
                return Err(PermissionError::not_whitelisted(&row.column, category, &profile.role_id));
            }
        }

        let strict = profile.validation_level == ValidationLevel::Strict;
        if strict && node.kind.is_mutation() {
            if let Some(row) = node.rows.iter().find(|r| r.dialect == Dialect::Inferred) {
                return Err(PermissionError {
                    column: row.column.clone(),
                    category: row.value.ty().category(),
                    role_id: profile.role_id.clone(),
                    reason: "strict roles require explicit type annotations".to_string(),
                });
            }
        }

        // Mutations are gated on every column they filter on or remove;
        // strict roles are gated on reads as well.
        if strict || node.kind.is_mutation() {
            let touched = node
                .predicate
                .iter()
                .flat_map(|p| p.columns())
                .chain(node.projection.iter().map(|c| (c.name.as_str(), &c.ty)));
            for (column, ty) in touched {
                let category = ty.category();
                if !profile.allows(category) {
                    return Err(PermissionError::not_whitelisted(column, category, &profile.role_id));
                }
            }
        }

        debug!(
            role = %profile.role_id,
            level = %profile.validation_level,
            table = %node.table,
            "permission check passed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::IRBuilder;
    use crate::features::parsing::parse_str;
    use crate::features::smt::IntervalVerifier;
    use crate::features::type_checking::check;
    use crate::shared::models::{ColumnDef, ProvenanceRecord, Schema, TypeCategory, TypeExpr};

    fn lower(source: &str) -> IRNode {
        let schema = Schema::new(
            "evidence",
            vec![
                ColumnDef::new("title", TypeExpr::NonEmptyString),
                ColumnDef::new("score", TypeExpr::Nat),
            ],
        )
        .unwrap();
        let typed = check(&parse_str(source).unwrap(), &schema, &IntervalVerifier).unwrap();
        IRBuilder::default()
            .lower(&typed, ProvenanceRecord::new("alice", 1, "why").ok())
            .unwrap()
    }

    #[test]
    fn test_row_category_outside_whitelist() {
        let node = lower("INSERT INTO evidence SET score = 42");
        let profile = PermissionProfile::new("writer", [TypeCategory::String]);
        let err = PermissionValidator.validate(&node, &profile).unwrap_err();
        assert_eq!(err.column, "score");
        assert_eq!(err.category, TypeCategory::Nat);
        assert_eq!(err.role_id, "writer");
        assert_eq!(err.reason, "category Nat not in whitelist");
    }

    #[test]
    fn test_resolved_not_declared_category() {
        // "ONS Data" infers as String but the column resolves to NonEmptyString
        let node = lower("INSERT INTO evidence SET title = \"ONS Data\"");
        let strings = PermissionProfile::new("writer", [TypeCategory::String]);
        assert!(PermissionValidator.validate(&node, &strings).is_err());
        let refined = PermissionProfile::new("writer", [TypeCategory::NonEmptyString]);
        assert!(PermissionValidator.validate(&node, &refined).is_ok());
    }

    #[test]
    fn test_standard_ignores_reads() {
        let node = lower("SELECT title FROM evidence WHERE score = 1");
        let profile = PermissionProfile::new("reader", Vec::<TypeCategory>::new());
        assert!(PermissionValidator.validate(&node, &profile).is_ok());
        let err = PermissionValidator
            .validate(&node, &profile.strict())
            .unwrap_err();
        assert_eq!(err.column, "score");
    }

    #[test]
    fn test_delete_is_gated_on_every_removed_column() {
        let node = lower("DELETE FROM evidence WHERE score = 3 RATIONALE \"gc\"");
        let nobody = PermissionProfile::new("nobody", Vec::<TypeCategory>::new());
        let err = PermissionValidator.validate(&node, &nobody).unwrap_err();
        assert_eq!(err.column, "score");

        // the predicate column alone is not enough: the whole row goes
        let scores_only = PermissionProfile::new("janitor", [TypeCategory::Nat]);
        let err = PermissionValidator.validate(&node, &scores_only).unwrap_err();
        assert_eq!(err.column, "title");
        assert_eq!(err.category, TypeCategory::NonEmptyString);

        let both = PermissionProfile::new("janitor", [TypeCategory::Nat, TypeCategory::NonEmptyString]);
        assert!(PermissionValidator.validate(&node, &both).is_ok());
    }

    #[test]
    fn test_update_is_gated_on_where_columns() {
        let node = lower("UPDATE evidence SET score = 5 WHERE title = \"x\" RATIONALE \"fix\"");
        let scores_only = PermissionProfile::new("editor", [TypeCategory::Nat]);
        let err = PermissionValidator.validate(&node, &scores_only).unwrap_err();
        assert_eq!(err.column, "title");

        let both = PermissionProfile::new("editor", [TypeCategory::Nat, TypeCategory::NonEmptyString]);
        assert!(PermissionValidator.validate(&node, &both).is_ok());
    }

    #[test]
    fn test_strict_checks_predicate_columns() {
        let node = lower("SELECT title FROM evidence WHERE score = 1");
        let profile = PermissionProfile::new("reader", [TypeCategory::NonEmptyString]).strict();
        let err = PermissionValidator.validate(&node, &profile).unwrap_err();
        assert_eq!(err.column, "score");
    }

    #[test]
    fn test_strict_rejects_inferred_mutation() {
        let profile = PermissionProfile::unrestricted("admin").strict();
        let inferred = lower("INSERT INTO evidence SET score = 42");
        let err = PermissionValidator.validate(&inferred, &profile).unwrap_err();
        assert_eq!(err.reason, "strict roles require explicit type annotations");
        let explicit = lower("INSERT INTO evidence SET score = 42 : Nat");
        assert!(PermissionValidator.validate(&explicit, &profile).is_ok());
    }
}
