//! Parsing infrastructure

mod parser;
mod token_stream;

pub use parser::{Parser, DEFAULT_MAX_DEPTH};
pub use token_stream::{Combinators, ParseResult, TokenStream};
