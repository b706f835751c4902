//! Type checking
//!
//! Turns a parsed `Statement` into a `TypedStatement` against one `Schema`.
//! Refinements are decided by an injected `ConstraintVerifier`; a value that
//! cannot be verified never reaches the IR.

pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::{coerce_literal, fold_constant, infer_literal, Coercion, TypeChecker};

use crate::features::parsing::Statement;
use crate::features::smt::ConstraintVerifier;
use crate::shared::models::Schema;

/// Type-check one statement
pub fn check(
    statement: &Statement,
    schema: &Schema,
    verifier: &dyn ConstraintVerifier,
) -> CheckResult<TypedStatement> {
    TypeChecker::new(schema, verifier).check(statement)
}
