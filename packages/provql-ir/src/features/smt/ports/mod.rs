//! Constraint verifier port

use crate::features::smt::domain::Verification;
use crate::shared::models::{TypeExpr, Value};

/// Decides whether a candidate value satisfies a type's refinement
///
/// Implementations may answer `Undecided`; callers then fall back to the
/// exhaustive runtime predicate. A verifier must never report `Satisfied`
/// for a value the runtime predicate rejects.
pub trait ConstraintVerifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn verify(&self, ty: &TypeExpr, value: &Value) -> Verification;
}
