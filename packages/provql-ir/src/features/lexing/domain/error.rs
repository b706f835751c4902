use crate::shared::models::Position;
use thiserror::Error;

/// Malformed literal, comment or escape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lex error at {position}: {reason}")]
pub struct LexError {
    pub position: Position,
    pub reason: String,
}

impl LexError {
    pub fn new(position: Position, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}
