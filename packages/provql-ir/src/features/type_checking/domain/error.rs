use crate::shared::models::{Position, TypeExpr};
use std::fmt;
use thiserror::Error;

/// Declared or inferred type mismatch, or a violated refinement
///
/// `column` is `None` for statement-level failures (unknown table, a WHERE
/// predicate that is not boolean).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TypeError {
    pub column: Option<String>,
    pub expected: String,
    pub actual: String,
    pub message: String,
    pub suggestion: Option<String>,
    pub position: Position,
}

impl TypeError {
    pub fn new(
        position: Position,
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            column: None,
            expected: expected.into(),
            actual: actual.into(),
            message: message.into(),
            suggestion: None,
            position,
        }
    }

    pub fn mismatch(position: Position, expected: &TypeExpr, actual: &TypeExpr) -> Self {
        Self::new(
            position,
            expected.to_string(),
            actual.to_string(),
            format!("expected {}, found {}", expected, actual),
        )
    }

    pub fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn maybe_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type error at {}", self.position)?;
        if let Some(column) = &self.column {
            write!(f, " in column '{}'", column)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// The verifier and the runtime fallback both failed to decide a refinement
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot verify column '{column}' of type {ty}: {detail}")]
pub struct ProofError {
    pub column: String,
    pub ty: TypeExpr,
    pub detail: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Proof(#[from] ProofError),
}

impl CheckError {
    pub fn position(&self) -> Position {
        match self {
            Self::Type(e) => e.position,
            Self::Proof(e) => e.position,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Type(e) => e.suggestion.as_deref(),
            Self::Proof(_) => None,
        }
    }
}

pub type CheckResult<T> = Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_column_and_suggestion() {
        let err = TypeError::new(
            Position::new(1, 27, 26),
            "BoundedNat(0, 100)",
            "150",
            "value 150 exceeds max 100",
        )
        .in_column("prompt_provenance")
        .with_suggestion("value must be within [0,100]");
        assert_eq!(
            err.to_string(),
            "type error at 1:27 in column 'prompt_provenance': value 150 exceeds max 100 (value must be within [0,100])"
        );
    }
}
