//! Typed values
//!
//! `TypedValue::new` is the only way to obtain a `TypedValue`, and it runs the
//! refinement predicate. Fields are private so a constructed value can never be
//! mutated out of its type.

use super::refinement::{decide, Decision};
use super::type_expr::TypeExpr;
use super::value::{PromptScores, Value};
use thiserror::Error;
use uuid::Uuid;

/// Failure to construct a `TypedValue`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefinementError {
    /// The value does not satisfy the type
    #[error("{detail} (type {ty})")]
    Violated {
        ty: TypeExpr,
        detail: String,
        suggestion: Option<String>,
    },

    /// The predicate cannot be evaluated for this value
    #[error("cannot decide {ty}: {reason}")]
    Undecidable { ty: TypeExpr, reason: String },
}

impl RefinementError {
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Violated { suggestion, .. } => suggestion.as_deref(),
            Self::Undecidable { .. } => None,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Violated { .. } => "refinement_violated",
            Self::Undecidable { .. } => "refinement_undecidable",
        }
    }
}

/// A value paired with the type it satisfies
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    ty: TypeExpr,
    value: Value,
}

impl TypedValue {
    /// Construct, checking shape and refinement
    pub fn new(ty: TypeExpr, value: Value) -> Result<Self, RefinementError> {
        match decide(&ty, &value) {
            Decision::Holds { .. } => Ok(Self { ty, value }),
            Decision::Fails { detail, suggestion } => Err(RefinementError::Violated {
                ty,
                detail,
                suggestion,
            }),
            Decision::Undecidable { reason } => Err(RefinementError::Undecidable { ty, reason }),
        }
    }

    pub fn bounded_nat(min: u64, max: u64, value: u64) -> Result<Self, RefinementError> {
        Self::new(TypeExpr::bounded_nat(min, max), Value::Nat(value))
    }

    pub fn non_empty_string(text: impl Into<String>) -> Result<Self, RefinementError> {
        Self::new(TypeExpr::NonEmptyString, Value::Text(text.into()))
    }

    pub fn confidence(value: f64) -> Result<Self, RefinementError> {
        Self::new(TypeExpr::Confidence, Value::Float(value))
    }

    pub fn prompt_scores(scores: PromptScores) -> Result<Self, RefinementError> {
        Self::new(TypeExpr::PromptScores, Value::Scores(scores))
    }

    pub fn nat(value: u64) -> Self {
        Self {
            ty: TypeExpr::Nat,
            value: Value::Nat(value),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            ty: TypeExpr::String,
            value: Value::Text(value.into()),
        }
    }

    pub fn uuid(value: Uuid) -> Self {
        Self {
            ty: TypeExpr::Uuid,
            value: Value::Uuid(value),
        }
    }

    pub fn ty(&self) -> &TypeExpr {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (TypeExpr, Value) {
        (self.ty, self.value)
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.value, self.ty)
    }
}
