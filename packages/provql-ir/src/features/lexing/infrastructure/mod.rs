//! Lexing infrastructure

mod lexer;

pub use lexer::{tokenize, Lexer};
