//! Refinement verification use case
//!
//! Static stage first, runtime predicate when the static stage is undecided.
//! Every accepted value is still built through `TypedValue::new`, so a
//! faulty static verifier cannot smuggle an ill-typed value into the IR.

use crate::features::smt::domain::{Verification, VerificationMethod};
use crate::features::smt::ports::ConstraintVerifier;
use crate::shared::models::{decide, Decision, RefinementError, TypeExpr, TypedValue, Value};
use thiserror::Error;
use tracing::{debug, trace};

/// Value proven to satisfy its type, with how it was proven
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedValue {
    pub typed: TypedValue,
    pub method: VerificationMethod,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerificationFailure {
    #[error("{detail}")]
    Violated {
        detail: String,
        suggestion: Option<String>,
    },

    #[error("undecidable: {reason}")]
    Undecidable { reason: String },
}

impl From<RefinementError> for VerificationFailure {
    fn from(error: RefinementError) -> Self {
        match error {
            RefinementError::Violated {
                detail, suggestion, ..
            } => Self::Violated { detail, suggestion },
            RefinementError::Undecidable { reason, .. } => Self::Undecidable { reason },
        }
    }
}

/// Verify `value` against `ty`, falling back to the runtime predicate
pub fn verify_refinement(
    verifier: &dyn ConstraintVerifier,
    ty: &TypeExpr,
    value: &Value,
) -> Result<VerifiedValue, VerificationFailure> {
    let (method, evidence) = match verifier.verify(ty, value) {
        Verification::Satisfied { method, evidence } => (method, evidence),
        Verification::Violated { detail, suggestion } => {
            trace!(verifier = verifier.name(), %ty, %detail, "refinement violated");
            return Err(VerificationFailure::Violated { detail, suggestion });
        }
        Verification::Undecided { reason } => {
            debug!(
                verifier = verifier.name(),
                %ty,
                %reason,
                "static stage undecided, using runtime predicate"
            );
            match decide(ty, value) {
                Decision::Holds { evidence } => {
                    let method = if ty.is_refined() {
                        VerificationMethod::RuntimePredicate
                    } else {
                        VerificationMethod::Structural
                    };
                    (method, evidence)
                }
                Decision::Fails { detail, suggestion } => {
                    return Err(VerificationFailure::Violated { detail, suggestion })
                }
                Decision::Undecidable { reason } => {
                    return Err(VerificationFailure::Undecidable { reason })
                }
            }
        }
    };

    let typed = TypedValue::new(ty.clone(), value.clone())?;
    Ok(VerifiedValue {
        typed,
        method,
        evidence,
    })
}
