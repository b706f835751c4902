//! Parsing Feature
//!
//! Builds a `Statement` AST from tokens.
//!
//! ## Structure
//! - `domain/` - AST, ParseError
//! - `infrastructure/` - TokenStream combinators, Parser

pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::{Combinators, ParseResult, Parser, TokenStream, DEFAULT_MAX_DEPTH};

use crate::features::lexing::{tokenize, Token};
use crate::shared::models::TypeExpr;

/// Parse one statement from tokens
pub fn parse(tokens: impl IntoIterator<Item = Token>) -> Result<Statement, ParseError> {
    Parser::new(tokens).parse_statement()
}

/// Tokenize and parse one statement
pub fn parse_str(source: &str) -> Result<Statement, SyntaxError> {
    Ok(parse(tokenize(source)?)?)
}

/// Parse a standalone type expression such as `BoundedNat(0, 100)`
pub fn parse_type_expr(source: &str) -> Result<TypeExpr, SyntaxError> {
    Ok(Parser::new(tokenize(source)?).parse_standalone_type()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_expr_display_reparses() {
        for ty in [
            TypeExpr::Nat,
            TypeExpr::bounded_nat(0, 100),
            TypeExpr::bounded_float(-0.5, 1e3),
            TypeExpr::vector(TypeExpr::vector(TypeExpr::Confidence, 2), 4),
            TypeExpr::PromptScores,
        ] {
            assert_eq!(parse_type_expr(&ty.to_string()).unwrap(), ty);
        }
    }

    #[test]
    fn test_parse_str_surfaces_lex_errors() {
        let err = parse_str("SELECT * FROM t WHERE a = \"open").unwrap_err();
        assert!(matches!(err, SyntaxError::Lex(_)));
        assert_eq!(err.position().column, 27);
    }
}
