//! Tokens

use super::keyword::{Keyword, TypeKeyword};
use crate::shared::models::{format_float, Position};
use std::fmt;

/// Literal payloads
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralToken {
    Natural(u64),
    Float(f64),
    /// Unescaped string contents
    String(String),
    Boolean(bool),
    Null,
}

/// Operators and punctuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Concat,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Semicolon,
    Dot,
}

impl Operator {
    /// Canonical spelling (`<>` lexes as `NotEq` and prints as `!=`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::Concat => "||",
            Self::Comma => ",",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Colon => ":",
            Self::Semicolon => ";",
            Self::Dot => ".",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    TypeKeyword(TypeKeyword),
    Identifier(String),
    Literal(LiteralToken),
    Operator(Operator),
    /// Only produced when the lexer is asked to keep comments
    Comment(String),
    EndOfInput,
}

impl TokenKind {
    /// Short description used in "expected ..., found ..." diagnostics
    pub fn describe(&self) -> String {
        match self {
            Self::Keyword(k) => format!("keyword {}", k),
            Self::TypeKeyword(t) => format!("type {}", t),
            Self::Identifier(name) => format!("identifier '{}'", name),
            Self::Literal(LiteralToken::Natural(n)) => format!("number {}", n),
            Self::Literal(LiteralToken::Float(x)) => format!("number {}", format_float(*x)),
            Self::Literal(LiteralToken::String(s)) => format!("string {:?}", s),
            Self::Literal(LiteralToken::Boolean(b)) => {
                format!("{}", if *b { "TRUE" } else { "FALSE" })
            }
            Self::Literal(LiteralToken::Null) => "NULL".to_string(),
            Self::Operator(op) => format!("'{}'", op),
            Self::Comment(_) => "comment".to_string(),
            Self::EndOfInput => "end of input".to_string(),
        }
    }
}

/// Token with its source text and start position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }

    /// Byte offset one past the token's source text
    pub fn end_offset(&self) -> usize {
        self.position.offset + self.lexeme.len()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.describe())
    }
}
