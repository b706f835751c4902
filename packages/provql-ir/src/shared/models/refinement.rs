//! Runtime refinement predicate
//!
//! `decide` is the total, exhaustive check behind every refinement type. It is
//! what `TypedValue::new` enforces and what the constraint verifier falls back
//! to when a static decision procedure answers `Undecided`.
//!
//! The only inputs it cannot decide are NaN floats and refinements whose own
//! parameters are malformed (empty or non-finite bounds).

use super::type_expr::{format_float, TypeExpr};
use super::value::{PromptScores, Value};

/// Outcome of the runtime predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Predicate holds; `evidence` states what was checked
    Holds { evidence: String },
    /// Predicate fails
    Fails {
        detail: String,
        suggestion: Option<String>,
    },
    /// Predicate cannot be evaluated for this input
    Undecidable { reason: String },
}

impl Decision {
    pub fn holds(&self) -> bool {
        matches!(self, Self::Holds { .. })
    }

    fn fails(detail: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Fails {
            detail: detail.into(),
            suggestion: Some(suggestion.into()),
        }
    }
}

/// Decide whether `value` inhabits `ty`
pub fn decide(ty: &TypeExpr, value: &Value) -> Decision {
    if let Err(reason) = ty.well_formed() {
        return Decision::Undecidable { reason };
    }

    match (ty, value) {
        (TypeExpr::Nat, Value::Nat(_))
        | (TypeExpr::Int, Value::Int(_))
        | (TypeExpr::String, Value::Text(_))
        | (TypeExpr::Bool, Value::Bool(_))
        | (TypeExpr::Uuid, Value::Uuid(_))
        | (TypeExpr::Timestamp, Value::Timestamp(_)) => Decision::Holds {
            evidence: "structural".to_string(),
        },
        (TypeExpr::Float, Value::Float(_)) => Decision::Holds {
            evidence: "structural".to_string(),
        },

        (TypeExpr::BoundedNat { min, max }, Value::Nat(v)) => {
            let suggestion = format!("value must be within [{},{}]", min, max);
            if v < min {
                Decision::fails(format!("value {} is below min {}", v, min), suggestion)
            } else if v > max {
                Decision::fails(format!("value {} exceeds max {}", v, max), suggestion)
            } else {
                Decision::Holds {
                    evidence: format!("{} <= {} <= {}", min, v, max),
                }
            }
        }

        (TypeExpr::BoundedFloat { min, max }, Value::Float(v)) => decide_float(*min, *max, *v),
        (TypeExpr::Confidence, Value::Float(v)) => decide_float(0.0, 1.0, *v),

        (TypeExpr::NonEmptyString, Value::Text(s)) => {
            if s.is_empty() {
                Decision::fails("string must not be empty", "provide at least one character")
            } else {
                Decision::Holds {
                    evidence: format!("len = {} > 0", s.chars().count()),
                }
            }
        }

        (TypeExpr::PromptScores, Value::Scores(scores)) => decide_scores(scores),

        (TypeExpr::Vector(element, len), Value::Vector(items)) => {
            if items.len() != *len {
                return Decision::fails(
                    format!("vector has {} elements, expected {}", items.len(), len),
                    format!("provide exactly {} elements", len),
                );
            }
            let mut evidence = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match decide(element, item) {
                    Decision::Holds { evidence: e } => evidence.push(e),
                    Decision::Fails { detail, suggestion } => {
                        return Decision::Fails {
                            detail: format!("element {}: {}", index, detail),
                            suggestion,
                        }
                    }
                    Decision::Undecidable { reason } => {
                        return Decision::Undecidable {
                            reason: format!("element {}: {}", index, reason),
                        }
                    }
                }
            }
            let evidence = if element.is_refined() {
                format!("len = {}; [{}]", len, evidence.join("; "))
            } else {
                format!("len = {}", len)
            };
            Decision::Holds { evidence }
        }

        (ty, value) => Decision::Fails {
            detail: format!("expected {}, found {} {}", ty, value.kind_name(), value),
            suggestion: None,
        },
    }
}

fn decide_float(min: f64, max: f64, v: f64) -> Decision {
    if v.is_nan() {
        return Decision::Undecidable {
            reason: "NaN cannot be ordered against refinement bounds".to_string(),
        };
    }
    let (lo, hi, x) = (format_float(min), format_float(max), format_float(v));
    let suggestion = format!("value must be within [{},{}]", lo, hi);
    if v < min {
        Decision::fails(format!("value {} is below min {}", x, lo), suggestion)
    } else if v > max {
        Decision::fails(format!("value {} exceeds max {}", x, hi), suggestion)
    } else {
        Decision::Holds {
            evidence: format!("{} <= {} <= {}", lo, x, hi),
        }
    }
}

fn decide_scores(scores: &PromptScores) -> Decision {
    for (name, score) in scores.entries() {
        if score > PromptScores::MAX_SCORE {
            return Decision::fails(
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
    Decision::Holds {
        evidence: format!(
            "all {} scores within [0,{}]",
            PromptScores::FIELDS.len(),
            PromptScores::MAX_SCORE
        ),
    }
}
