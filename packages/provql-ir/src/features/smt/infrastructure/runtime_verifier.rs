//! Runtime-predicate verifiers

use crate::features::smt::domain::{Verification, VerificationMethod};
use crate::features::smt::ports::ConstraintVerifier;
use crate::shared::models::{decide, Decision, TypeExpr, Value};

/// Verifier backed by the exhaustive runtime predicate
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimePredicateVerifier;

impl ConstraintVerifier for RuntimePredicateVerifier {
    fn name(&self) -> &'static str {
        "runtime_predicate"
    }

    fn verify(&self, ty: &TypeExpr, value: &Value) -> Verification {
        match decide(ty, value) {
            Decision::Holds { evidence } => {
                let method = if ty.is_refined() {
                    VerificationMethod::RuntimePredicate
                } else {
                    VerificationMethod::Structural
                };
                Verification::Satisfied { method, evidence }
            }
            Decision::Fails { detail, suggestion } => Verification::Violated { detail, suggestion },
            Decision::Undecidable { reason } => Verification::Undecided { reason },
        }
    }
}

/// Static stage that never decides, leaving every value to the runtime fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOnlyVerifier;

impl ConstraintVerifier for RuntimeOnlyVerifier {
    fn name(&self) -> &'static str {
        "runtime_only"
    }

    fn verify(&self, _ty: &TypeExpr, _value: &Value) -> Verification {
        Verification::undecided("static verification disabled")
    }
}
