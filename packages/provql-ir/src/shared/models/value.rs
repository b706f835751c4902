//! Runtime value representations
//!
//! A `Value` is untyped data. It only becomes trustworthy when paired with a
//! `TypeExpr` inside a [`super::TypedValue`].

use super::type_expr::format_float;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use uuid::Uuid;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nat(u64),
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Uuid(Uuid),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
    Vector(Vec<Value>),
    Scores(PromptScores),
}

impl Value {
    /// Human-readable name of the value's shape, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nat(_) => "natural",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::Vector(_) => "vector",
            Self::Scores(_) => "prompt scores",
        }
    }

    /// Numeric view used by comparisons and arithmetic
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Nat(n) => Some(*n as f64),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Timestamp(t) => Some(*t as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nat(n) => write!(f, "{}", n),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Uuid(u) => write!(f, "\"{}\"", u.hyphenated()),
            Self::Timestamp(ms) => match timestamp_to_rfc3339(*ms) {
                Some(text) => write!(f, "\"{}\"", text),
                None => write!(f, "{}", ms),
            },
            Self::Vector(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Scores(scores) => write!(f, "{}", scores),
        }
    }
}

/// Format epoch milliseconds as RFC 3339 (UTC)
pub fn timestamp_to_rfc3339(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse an RFC 3339 timestamp into epoch milliseconds
pub fn rfc3339_to_timestamp(text: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// Composite prompt score vector
///
/// Five named scores; the `[0, 100]` bound is a refinement checked when the
/// scores are wrapped in a `TypedValue`, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PromptScores {
    pub structure: u64,
    pub context: u64,
    pub evidence: u64,
    pub reasoning: u64,
    pub clarity: u64,
}

impl PromptScores {
    pub const FIELDS: [&'static str; 5] = ["structure", "context", "evidence", "reasoning", "clarity"];
    pub const MAX_SCORE: u64 = 100;

    pub fn new(structure: u64, context: u64, evidence: u64, reasoning: u64, clarity: u64) -> Self {
        Self {
            structure,
            context,
            evidence,
            reasoning,
            clarity,
        }
    }

    /// Named scores in declaration order
    pub fn entries(&self) -> [(&'static str, u64); 5] {
        [
            ("structure", self.structure),
            ("context", self.context),
            ("evidence", self.evidence),
            ("reasoning", self.reasoning),
            ("clarity", self.clarity),
        ]
    }

    /// Build from named fields; every field must appear exactly once
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, u64)>,
    ) -> Result<Self, String> {
        let mut slots: [Option<u64>; 5] = [None; 5];
        for (name, score) in entries {
            let index = Self::FIELDS
                .iter()
                .position(|f| *f == name)
                .ok_or_else(|| {
                    format!(
                        "unknown prompt score '{}' (expected one of {})",
                        name,
                        Self::FIELDS.join(", ")
                    )
                })?;
            if slots[index].replace(score).is_some() {
                return Err(format!("prompt score '{}' given twice", name));
            }
        }
        let mut values = [0u64; 5];
        for (index, slot) in slots.iter().enumerate() {
            values[index] =
                slot.ok_or_else(|| format!("missing prompt score '{}'", Self::FIELDS[index]))?;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3], values[4]))
    }

    /// Mean of the five scores
    pub fn mean(&self) -> f64 {
        self.entries().iter().map(|(_, v)| *v as f64).sum::<f64>() / 5.0
    }
}

impl fmt::Display for PromptScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, score)) in self.entries().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, score)?;
        }
        f.write_str("}")
    }
}
