//! Token cursor and parser combinators
//!
//! The stream always ends in `EndOfInput` and never advances past it, so
//! `peek()` is total.

use crate::features::lexing::{Keyword, Operator, Token, TokenKind};
use crate::features::parsing::domain::ParseError;
use crate::shared::models::Position;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    /// Build from lexer output; comments are dropped and a missing
    /// `EndOfInput` is appended
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Comment(_)))
            .collect();
        if !tokens.last().is_some_and(Token::is_end) {
            let position = tokens
                .last()
                .map(|t| {
                    let end = t.end_offset();
                    Position::new(
                        t.position.line,
                        t.position.column + t.lexeme.chars().count() as u32,
                        end,
                    )
                })
                .unwrap_or_default();
            tokens.push(Token::new(TokenKind::EndOfInput, "", position));
        }
        Self { tokens, index: 0 }
    }

    pub fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// Token `n` places ahead (clamped to `EndOfInput`)
    pub fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + n).min(last)]
    }

    pub fn position(&self) -> Position {
        self.peek().position
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().is_end()
    }

    /// Consume and return the current token
    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_end() {
            self.index += 1;
        }
        token
    }

    /// Consume the current token if `f` maps it to a value
    pub fn next_if_map<T>(&mut self, f: impl FnOnce(&Token) -> Option<T>) -> Option<T> {
        let value = f(self.peek())?;
        self.advance();
        Some(value)
    }

    pub fn next_if_keyword(&mut self, keyword: Keyword) -> bool {
        self.next_if_map(|t| t.is_keyword(keyword).then_some(()))
            .is_some()
    }

    pub fn next_if_operator(&mut self, op: Operator) -> bool {
        self.next_if_map(|t| t.is_operator(op).then_some(())).is_some()
    }

    /// Consume a token accepted by `f`, or fail naming `expected`
    pub fn expect<T>(
        &mut self,
        expected: &str,
        f: impl FnOnce(&Token) -> Option<T>,
    ) -> ParseResult<T> {
        match self.next_if_map(f) {
            Some(value) => Ok(value),
            None => Err(self.unexpected([expected])),
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<Token> {
        if self.peek().is_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.unexpected([keyword.as_str()]))
        }
    }

    pub fn expect_operator(&mut self, op: Operator) -> ParseResult<Token> {
        if self.peek().is_operator(op) {
            Ok(self.advance())
        } else {
            Err(self.unexpected([format!("'{}'", op)]))
        }
    }

    /// Error for the current token
    pub fn unexpected(&self, expected: impl IntoIterator<Item = impl Into<String>>) -> ParseError {
        let token = self.peek();
        ParseError::expected(token.position, expected, token.kind.describe())
    }
}

/// `optional`, `many` and `sep_by` over anything that owns a token cursor
pub trait Combinators: Sized {
    fn tokens(&mut self) -> &mut TokenStream;

    /// Run `parser`; a failure that consumed no tokens becomes `None`
    fn optional<T>(
        &mut self,
        parser: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Option<T>> {
        let start = self.tokens().index;
        match parser(self) {
            Ok(value) => Ok(Some(value)),
            Err(_) if self.tokens().index == start => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Zero or more repetitions of `parser`
    fn many<T>(
        &mut self,
        mut parser: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        loop {
            let before = self.tokens().index;
            match self.optional(&mut parser)? {
                Some(item) => items.push(item),
                None => return Ok(items),
            }
            if self.tokens().index == before {
                return Ok(items);
            }
        }
    }

    /// One or more `parser` items separated by `separator`
    fn sep_by<T>(
        &mut self,
        separator: Operator,
        mut parser: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = vec![parser(self)?];
        while self.tokens().next_if_operator(separator) {
            items.push(parser(self)?);
        }
        Ok(items)
    }
}

impl Combinators for TokenStream {
    fn tokens(&mut self) -> &mut TokenStream {
        self
    }
}
