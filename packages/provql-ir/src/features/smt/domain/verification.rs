//! Constraint verifier results

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a refinement was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// Decided by interval reasoning over the literal
    StaticInterval,
    /// Decided by the exhaustive runtime predicate after the static stage gave up
    RuntimePredicate,
    /// Unrefined type; only the value's shape was checked
    Structural,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticInterval => "static_interval",
            Self::RuntimePredicate => "runtime_predicate",
            Self::Structural => "structural",
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static_interval" => Ok(Self::StaticInterval),
            "runtime_predicate" => Ok(Self::RuntimePredicate),
            "structural" => Ok(Self::Structural),
            other => Err(format!("unknown verification method '{}'", other)),
        }
    }
}

/// Answer of a constraint verifier
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Satisfied {
        method: VerificationMethod,
        evidence: String,
    },
    Violated {
        detail: String,
        suggestion: Option<String>,
    },
    Undecided {
        reason: String,
    },
}

impl Verification {
    pub fn satisfied(method: VerificationMethod, evidence: impl Into<String>) -> Self {
        Self::Satisfied {
            method,
            evidence: evidence.into(),
        }
    }

    pub fn violated(detail: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Violated {
            detail: detail.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    pub fn undecided(reason: impl Into<String>) -> Self {
        Self::Undecided {
            reason: reason.into(),
        }
    }
}
