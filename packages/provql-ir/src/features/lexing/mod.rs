//! Lexing Feature
//!
//! Turns statement text into a lazy, restartable token stream.
//!
//! ## Structure
//! - `domain/` - Token, Keyword, Operator, LexError
//! - `infrastructure/` - Lexer (hand-written scanner)

pub mod domain;
pub mod infrastructure;

pub use domain::{
    Keyword, LexError, LiteralToken, Operator, Token, TokenKind, TypeKeyword,
};
pub use infrastructure::{tokenize, Lexer};
