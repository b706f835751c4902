//! Type expressions
//!
//! `TypeExpr` is the closed set of column/value types the language knows.
//! Refinement variants narrow a base type by a predicate (bounds, non-emptiness);
//! the predicate itself is decided in [`super::refinement`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Type expression (immutable, structurally compared)
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Nat,
    Int,
    String,
    Bool,
    Float,
    Uuid,
    Timestamp,
    /// Natural number within `[min, max]`
    BoundedNat { min: u64, max: u64 },
    /// Float within `[min, max]`
    BoundedFloat { min: f64, max: f64 },
    NonEmptyString,
    /// Float within `[0, 1]`
    Confidence,
    /// Fixed-length vector of an element type
    Vector(Box<TypeExpr>, usize),
    /// Composite score vector, five named scores each within `[0, 100]`
    PromptScores,
}

impl TypeExpr {
    pub fn bounded_nat(min: u64, max: u64) -> Self {
        Self::BoundedNat { min, max }
    }

    pub fn bounded_float(min: f64, max: f64) -> Self {
        Self::BoundedFloat { min, max }
    }

    pub fn vector(element: TypeExpr, len: usize) -> Self {
        Self::Vector(Box::new(element), len)
    }

    /// Permission/whitelist category of this type
    pub fn category(&self) -> TypeCategory {
        match self {
            Self::Nat => TypeCategory::Nat,
            Self::Int => TypeCategory::Int,
            Self::String => TypeCategory::String,
            Self::Bool => TypeCategory::Bool,
            Self::Float => TypeCategory::Float,
            Self::Uuid => TypeCategory::Uuid,
            Self::Timestamp => TypeCategory::Timestamp,
            Self::BoundedNat { .. } => TypeCategory::BoundedNat,
            Self::BoundedFloat { .. } => TypeCategory::BoundedFloat,
            Self::NonEmptyString => TypeCategory::NonEmptyString,
            Self::Confidence => TypeCategory::Confidence,
            Self::Vector(..) => TypeCategory::Vector,
            Self::PromptScores => TypeCategory::PromptScores,
        }
    }

    /// Base type with every refinement erased
    ///
    /// Comparisons and arithmetic are typed against the base type.
    pub fn base(&self) -> TypeExpr {
        match self {
            Self::BoundedNat { .. } => Self::Nat,
            Self::BoundedFloat { .. } | Self::Confidence => Self::Float,
            Self::NonEmptyString => Self::String,
            Self::Vector(element, len) => Self::Vector(Box::new(element.base()), *len),
            other => other.clone(),
        }
    }

    /// Whether values of this type carry a predicate beyond their shape
    pub fn is_refined(&self) -> bool {
        match self {
            Self::BoundedNat { .. }
            | Self::BoundedFloat { .. }
            | Self::NonEmptyString
            | Self::Confidence
            | Self::PromptScores => true,
            Self::Vector(element, _) => element.is_refined(),
            _ => false,
        }
    }

    /// Numeric base types (usable with arithmetic operators)
    pub fn is_numeric(&self) -> bool {
        matches!(self.base(), Self::Nat | Self::Int | Self::Float)
    }

    /// Types accepted by `<`, `<=`, `>`, `>=`
    pub fn is_orderable(&self) -> bool {
        matches!(
            self.base(),
            Self::Nat | Self::Int | Self::Float | Self::String | Self::Timestamp
        )
    }

    /// Check the refinement parameters themselves (bounds ordered and finite)
    pub fn well_formed(&self) -> Result<(), String> {
        match self {
            Self::BoundedNat { min, max } if min > max => Err(format!(
                "empty refinement {}: min {} exceeds max {}",
                self, min, max
            )),
            Self::BoundedFloat { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    Err(format!("refinement {} has non-finite bounds", self))
                } else if min > max {
                    Err(format!(
                        "empty refinement {}: min {} exceeds max {}",
                        self,
                        format_float(*min),
                        format_float(*max)
                    ))
                } else {
                    Ok(())
                }
            }
            Self::Vector(element, _) => element.well_formed(),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nat => write!(f, "Nat"),
            Self::Int => write!(f, "Int"),
            Self::String => write!(f, "String"),
            Self::Bool => write!(f, "Bool"),
            Self::Float => write!(f, "Float"),
            Self::Uuid => write!(f, "Uuid"),
            Self::Timestamp => write!(f, "Timestamp"),
            Self::BoundedNat { min, max } => write!(f, "BoundedNat({}, {})", min, max),
            Self::BoundedFloat { min, max } => write!(
                f,
                "BoundedFloat({}, {})",
                format_float(*min),
                format_float(*max)
            ),
            Self::NonEmptyString => write!(f, "NonEmptyString"),
            Self::Confidence => write!(f, "Confidence"),
            Self::Vector(element, len) => write!(f, "Vector({}, {})", element, len),
            Self::PromptScores => write!(f, "PromptScores"),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::features::parsing::parse_type_expr(s).map_err(|e| e.to_string())
    }
}

impl Serialize for TypeExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Render a float so that it always reads back as a float literal
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Type category (TypeExpr variant without parameters)
///
/// Permission profiles whitelist categories, not full types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeCategory {
    Nat,
    Int,
    String,
    Bool,
    Float,
    Uuid,
    Timestamp,
    BoundedNat,
    BoundedFloat,
    NonEmptyString,
    Confidence,
    Vector,
    PromptScores,
}

impl TypeCategory {
    pub const ALL: [TypeCategory; 13] = [
        Self::Nat,
        Self::Int,
        Self::String,
        Self::Bool,
        Self::Float,
        Self::Uuid,
        Self::Timestamp,
        Self::BoundedNat,
        Self::BoundedFloat,
        Self::NonEmptyString,
        Self::Confidence,
        Self::Vector,
        Self::PromptScores,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nat => "Nat",
            Self::Int => "Int",
            Self::String => "String",
            Self::Bool => "Bool",
            Self::Float => "Float",
            Self::Uuid => "Uuid",
            Self::Timestamp => "Timestamp",
            Self::BoundedNat => "BoundedNat",
            Self::BoundedFloat => "BoundedFloat",
            Self::NonEmptyString => "NonEmptyString",
            Self::Confidence => "Confidence",
            Self::Vector => "Vector",
            Self::PromptScores => "PromptScores",
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown type category '{}'", s))
    }
}
