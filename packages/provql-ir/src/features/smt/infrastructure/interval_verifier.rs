//! Static interval verifier
//!
//! Decides bound refinements of literal values by interval membership. It
//! answers `Undecided` for anything outside interval reasoning: NaN, empty or
//! non-finite refinement bounds, and values whose shape does not match the
//! type.

use crate::features::smt::domain::{Interval, Verification, VerificationMethod};
use crate::features::smt::ports::ConstraintVerifier;
use crate::shared::models::{format_float, PromptScores, TypeExpr, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalVerifier;

impl IntervalVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl ConstraintVerifier for IntervalVerifier {
    fn name(&self) -> &'static str {
        "interval"
    }

    fn verify(&self, ty: &TypeExpr, value: &Value) -> Verification {
        match (ty, value) {
            (TypeExpr::BoundedNat { min, max }, Value::Nat(v)) => {
                within(*min, *max, *v, |x| x.to_string())
            }
            (TypeExpr::BoundedFloat { min, max }, Value::Float(v)) => float_within(*min, *max, *v),
            (TypeExpr::Confidence, Value::Float(v)) => float_within(0.0, 1.0, *v),
            (TypeExpr::NonEmptyString, Value::Text(s)) => {
                let len = s.chars().count();
                let interval = Interval::lower_bounded(1usize, false);
                if interval.contains(len) {
                    Verification::satisfied(
                        VerificationMethod::StaticInterval,
                        format!("len = {} in {}", len, interval),
                    )
                } else {
                    Verification::violated(
                        "string must not be empty",
                        "provide at least one character",
                    )
                }
            }
            (TypeExpr::PromptScores, Value::Scores(scores)) => scores_within(scores),
            (TypeExpr::Vector(element, len), Value::Vector(items)) => {
                vector_within(self, element, *len, items)
            }
            (ty, value) if !ty.is_refined() && shape_matches(ty, value) => {
                Verification::satisfied(
                    VerificationMethod::Structural,
                    format!("{} value", ty.category()),
                )
            }
            (ty, value) => Verification::undecided(format!(
                "{} {} is outside interval reasoning for {}",
                value.kind_name(),
                value,
                ty
            )),
        }
    }
}

fn within<T>(min: T, max: T, value: T, render: fn(T) -> String) -> Verification
where
    T: PartialOrd + Copy,
{
    let interval = Interval::bounded(min, max);
    let (lo, hi, v) = (render(min), render(max), render(value));
    if interval.is_empty() {
        return Verification::undecided(format!("empty refinement interval [{}, {}]", lo, hi));
    }
    if interval.contains(value) {
        return Verification::satisfied(
            VerificationMethod::StaticInterval,
            format!("{} <= {} <= {}", lo, v, hi),
        );
    }
    let suggestion = format!("value must be within [{},{}]", lo, hi);
    if interval.is_below(value) {
        Verification::violated(format!("value {} is below min {}", v, lo), suggestion)
    } else {
        Verification::violated(format!("value {} exceeds max {}", v, hi), suggestion)
    }
}

fn float_within(min: f64, max: f64, value: f64) -> Verification {
    if value.is_nan() {
        return Verification::undecided("NaN has no position in an interval");
    }
    if !min.is_finite() || !max.is_finite() {
        return Verification::undecided("refinement bounds are not finite");
    }
    within(min, max, value, format_float)
}

fn scores_within(scores: &PromptScores) -> Verification {
    let interval = Interval::bounded(0, PromptScores::MAX_SCORE);
    for (name, score) in scores.entries() {
        if !interval.contains(score) {
            return Verification::violated(
                format!(
                    "score '{}' = {} exceeds max {}",
                    name,
                    score,
                    PromptScores::MAX_SCORE
                ),
                format!(
                    "each prompt score must be within [0,{}]",
                    PromptScores::MAX_SCORE
                ),
            );
        }
    }
    Verification::satisfied(
        VerificationMethod::StaticInterval,
        format!("all {} scores in {}", PromptScores::FIELDS.len(), interval),
    )
}

fn vector_within(
    verifier: &IntervalVerifier,
    element: &TypeExpr,
    len: usize,
    items: &[Value],
) -> Verification {
    if !Interval::exactly(len).contains(items.len()) {
        return Verification::violated(
            format!("vector has {} elements, expected {}", items.len(), len),
            format!("provide exactly {} elements", len),
        );
    }
    let mut method = VerificationMethod::Structural;
    for (index, item) in items.iter().enumerate() {
        match verifier.verify(element, item) {
            Verification::Satisfied {
                method: VerificationMethod::StaticInterval,
                ..
            } => method = VerificationMethod::StaticInterval,
            Verification::Satisfied { .. } => {}
            Verification::Violated { detail, suggestion } => {
                return Verification::Violated {
                    detail: format!("element {}: {}", index, detail),
                    suggestion,
                }
            }
            Verification::Undecided { reason } => {
                return Verification::undecided(format!("element {}: {}", index, reason))
            }
        }
    }
    Verification::satisfied(
        method,
        format!("len = {}; every element satisfies {}", len, element),
    )
}

fn shape_matches(ty: &TypeExpr, value: &Value) -> bool {
    matches!(
        (ty, value),
        (TypeExpr::Nat, Value::Nat(_))
            | (TypeExpr::Int, Value::Int(_))
            | (TypeExpr::Float, Value::Float(_))
            | (TypeExpr::String, Value::Text(_))
            | (TypeExpr::Bool, Value::Bool(_))
            | (TypeExpr::Uuid, Value::Uuid(_))
            | (TypeExpr::Timestamp, Value::Timestamp(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{decide, Decision};

    #[test]
    fn test_bounded_nat_messages() {
        let v = IntervalVerifier::new();
        assert_eq!(
            v.verify(&TypeExpr::bounded_nat(0, 100), &Value::Nat(150)),
            Verification::violated("value 150 exceeds max 100", "value must be within [0,100]")
        );
        assert_eq!(
            v.verify(&TypeExpr::bounded_nat(5, 10), &Value::Nat(3)),
            Verification::violated("value 3 is below min 5", "value must be within [5,10]")
        );
        assert!(matches!(
            v.verify(&TypeExpr::bounded_nat(0, 100), &Value::Nat(87)),
            Verification::Satisfied {
                method: VerificationMethod::StaticInterval,
                ..
            }
        ));
    }

    #[test]
    fn test_confidence_suggestion_uses_float_bounds() {
        let v = IntervalVerifier::new();
        match v.verify(&TypeExpr::Confidence, &Value::Float(1.5)) {
            Verification::Violated { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("value must be within [0.0,1.0]"))
            }
            other => panic!("expected violation, got {:?}", other),
        }
    }

    #[test]
    fn test_undecided_cases() {
        let v = IntervalVerifier::new();
        for (ty, value) in [
            (TypeExpr::Confidence, Value::Float(f64::NAN)),
            (TypeExpr::bounded_nat(10, 1), Value::Nat(5)),
            (TypeExpr::bounded_nat(0, 10), Value::Text("5".into())),
            (TypeExpr::Nat, Value::Bool(true)),
        ] {
            assert!(matches!(v.verify(&ty, &value), Verification::Undecided { .. }));
        }
    }

    #[test]
    fn test_structural_for_unrefined() {
        let v = IntervalVerifier::new();
        assert!(matches!(
            v.verify(&TypeExpr::vector(TypeExpr::Float, 2), &Value::Vector(vec![Value::Float(1.0), Value::Float(2.0)])),
            Verification::Satisfied {
                method: VerificationMethod::Structural,
                ..
            }
        ));
    }

    #[test]
    fn test_never_satisfied_when_runtime_rejects() {
        let v = IntervalVerifier::new();
        let cases = [
            (TypeExpr::bounded_nat(0, 100), Value::Nat(101)),
            (TypeExpr::NonEmptyString, Value::Text(String::new())),
            (TypeExpr::Confidence, Value::Float(-0.01)),
            (TypeExpr::PromptScores, Value::Scores(PromptScores::new(1, 2, 3, 4, 101))),
            (
                TypeExpr::vector(TypeExpr::Confidence, 2),
                Value::Vector(vec![Value::Float(0.5)]),
            ),
        ];
        for (ty, value) in cases {
            assert!(!decide(&ty, &value).holds());
            assert!(!matches!(v.verify(&ty, &value), Verification::Satisfied { .. }));
            assert!(matches!(decide(&ty, &value), Decision::Fails { .. }));
        }
    }
}
