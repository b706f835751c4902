//! Lexing domain models

mod error;
mod keyword;
mod token;

pub use error::LexError;
pub use keyword::{Keyword, TypeKeyword};
pub use token::{LiteralToken, Operator, Token, TokenKind};
