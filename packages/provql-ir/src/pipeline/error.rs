//! Typed pipeline errors
//!
//! Every stage error converts into a `PipelineError` that names the stage it
//! failed in, the source position when one exists, and a suggestion where
//! the stage can offer one.

use super::state::{IllegalTransition, PipelineState};
use crate::features::catalog::CatalogError;
use crate::features::ir_generation::LoweringError;
use crate::features::lexing::LexError;
use crate::features::parsing::{ParseError, SyntaxError};
use crate::features::permission::PermissionError;
use crate::features::serialization::SerializationError;
use crate::features::type_checking::CheckError;
use crate::shared::models::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineErrorKind {
    Lex,
    Parse,
    Type,
    Proof,
    Permission,
    Provenance,
    Serialization,
    Catalog,
    /// Schema lookup exceeded the per-request timeout
    Timeout,
    /// Caller cancelled at a stage boundary
    Cancelled,
    /// Source size, token count or nesting limit exceeded
    Limit,
    /// State machine misuse; indicates a bug in the orchestrator
    Internal,
}

impl PipelineErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lex => "lex",
            Self::Parse => "parse",
            Self::Type => "type",
            Self::Proof => "proof",
            Self::Permission => "permission",
            Self::Provenance => "provenance",
            Self::Serialization => "serialization",
            Self::Catalog => "catalog",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Limit => "limit",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compile failure surfaced to callers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct PipelineError {
    pub stage: PipelineState,
    pub kind: PipelineErrorKind,
    pub position: Option<Position>,
    pub message: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error during {}", self.kind, self.stage)?;
        if let Some(position) = self.position {
            write!(f, " at {}", position)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (hint: {})", suggestion)?;
        }
        Ok(())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn new(stage: PipelineState, kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            position: None,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    fn maybe_suggestion(mut self, suggestion: Option<impl Into<String>>) -> Self {
        self.suggestion = suggestion.map(Into::into);
        self
    }

    /// Schema lookup timed out
    pub fn timeout(stage: PipelineState, what: impl Into<String>, limit: Duration) -> Self {
        Self::new(
            stage,
            PipelineErrorKind::Timeout,
            format!("{} exceeded {}ms", what.into(), limit.as_millis()),
        )
        .with_suggestion("retry, or raise catalog.lookup_timeout_ms")
    }

    /// Cancelled before `stage` started
    pub fn cancelled(stage: PipelineState) -> Self {
        Self::new(
            stage,
            PipelineErrorKind::Cancelled,
            format!("request cancelled before {}", stage),
        )
    }

    pub fn limit(stage: PipelineState, field: &str, limit: usize, actual: usize) -> Self {
        Self::new(
            stage,
            PipelineErrorKind::Limit,
            format!("{} {} exceeds the limit of {}", field, actual, limit),
        )
        .with_suggestion(format!("split the statement or raise limits.{}", field))
    }

    pub fn catalog(stage: PipelineState, error: CatalogError) -> Self {
        Self::new(stage, PipelineErrorKind::Catalog, error.to_string())
    }

    /// Check if error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, PipelineErrorKind::Timeout)
    }

    /// Error category for logs and exit codes
    pub fn category(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl From<LexError> for PipelineError {
    fn from(error: LexError) -> Self {
        Self::new(PipelineState::Tokenizing, PipelineErrorKind::Lex, error.reason).at(error.position)
    }
}

impl From<ParseError> for PipelineError {
    fn from(error: ParseError) -> Self {
        let policy = error.message.is_some();
        let suggestion = match error.expected.as_slice() {
            [one] if policy => Some(format!("add {}", one)),
            _ => None,
        };
        Self::new(PipelineState::Parsing, PipelineErrorKind::Parse, error.reason())
            .at(error.position)
            .maybe_suggestion(suggestion)
    }
}

impl From<SyntaxError> for PipelineError {
    fn from(error: SyntaxError) -> Self {
        match error {
            SyntaxError::Lex(e) => e.into(),
            SyntaxError::Parse(e) => e.into(),
        }
    }
}

impl From<CheckError> for PipelineError {
    fn from(error: CheckError) -> Self {
        let kind = match &error {
            CheckError::Type(_) => PipelineErrorKind::Type,
            CheckError::Proof(_) => PipelineErrorKind::Proof,
        };
        let suggestion = error.suggestion().map(str::to_string);
        let message = match &error {
            CheckError::Type(e) => match &e.column {
                Some(column) => format!("column '{}': {}", column, e.message),
                None => e.message.clone(),
            },
            CheckError::Proof(e) => e.to_string(),
        };
        Self::new(PipelineState::TypeChecking, kind, message)
            .at(error.position())
            .maybe_suggestion(suggestion)
    }
}

impl From<LoweringError> for PipelineError {
    fn from(error: LoweringError) -> Self {
        let stage = PipelineState::IRGenerating;
        match &error {
            LoweringError::MissingProvenance { field, .. } => {
                let clause = if *field == "actor" {
                    "an ACTOR"
                } else {
                    "a RATIONALE"
                };
                Self::new(stage, PipelineErrorKind::Provenance, error.to_string()).with_suggestion(
                    format!("add {} clause or supply a request default", clause),
                )
            }
            LoweringError::Provenance(_) => {
                Self::new(stage, PipelineErrorKind::Provenance, error.to_string())
            }
            LoweringError::Refinement(_) => {
                Self::new(stage, PipelineErrorKind::Type, error.to_string())
            }
        }
    }
}

impl From<PermissionError> for PipelineError {
    fn from(error: PermissionError) -> Self {
        let suggestion = error.suggestion();
        Self::new(
            PipelineState::PermissionValidating,
            PipelineErrorKind::Permission,
            error.to_string(),
        )
        .with_suggestion(suggestion)
    }
}

impl From<SerializationError> for PipelineError {
    fn from(error: SerializationError) -> Self {
        Self::new(
            PipelineState::Serializing,
            PipelineErrorKind::Serialization,
            error.to_string(),
        )
    }
}

/// Schema and profile lookups feed type checking
impl From<CatalogError> for PipelineError {
    fn from(error: CatalogError) -> Self {
        Self::catalog(PipelineState::TypeChecking, error)
    }
}

impl From<IllegalTransition> for PipelineError {
    fn from(error: IllegalTransition) -> Self {
        Self::new(error.from, PipelineErrorKind::Internal, error.to_string())
    }
}
