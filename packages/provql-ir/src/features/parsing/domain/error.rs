use crate::features::lexing::LexError;
use crate::shared::models::Position;
use std::fmt;
use thiserror::Error;

/// First syntax failure of a statement
///
/// `expected` lists what would have been accepted at `position`; `message`
/// overrides the generic "expected ..., found ..." text for grammar policies
/// such as DELETE requiring WHERE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub position: Position,
    pub expected: Vec<String>,
    pub found: String,
    pub message: Option<String>,
}

impl ParseError {
    pub fn expected(
        position: Position,
        expected: impl IntoIterator<Item = impl Into<String>>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            position,
            expected: expected.into_iter().map(Into::into).collect(),
            found: found.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Human-readable description without the position prefix
    pub fn reason(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match self.expected.as_slice() {
            [] => format!("unexpected {}", self.found),
            [one] => format!("expected {}, found {}", one, self.found),
            many => format!(
                "expected one of {}, found {}",
                many.join(", "),
                self.found
            ),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.position, self.reason())
    }
}

/// Lexing or parsing failure for text inputs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn position(&self) -> Position {
        match self {
            Self::Lex(e) => e.position,
            Self::Parse(e) => e.position,
        }
    }
}
