use super::format::Format;
use crate::shared::models::RefinementError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SerializationError {
    #[error("unknown tag {0:#x}")]
    UnknownTag(u64),

    #[error("invalid content for tag {tag:#x}: {reason}")]
    InvalidTag { tag: u64, reason: String },

    #[error("truncated input at offset {offset}: need {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    #[error("malformed length at offset {offset}: {reason}")]
    MalformedLength { offset: usize, reason: String },

    #[error("expected {expected}, found {found}")]
    UnexpectedItem { expected: String, found: String },

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("decoded value rejected: {0}")]
    Refinement(#[from] RefinementError),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("packed form error: {0}")]
    Packed(String),

    #[error("{count} trailing bytes after item at offset {offset}")]
    TrailingBytes { offset: usize, count: usize },

    #[error("{format} does not support {what}")]
    Unsupported { format: Format, what: String },
}

impl SerializationError {
    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedItem {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownTag(_) | Self::InvalidTag { .. } => "tag",
            Self::Truncated { .. } | Self::MalformedLength { .. } | Self::TrailingBytes { .. } => {
                "framing"
            }
            Self::UnexpectedItem { .. } | Self::InvalidField { .. } => "structure",
            Self::Refinement(_) => "refinement",
            Self::Json(_) => "json",
            Self::Packed(_) => "packed",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

pub type SerializationResult<T> = Result<T, SerializationError>;
