//! Hand-written scanner
//!
//! The lexer is a lazy `Iterator` over `Result<Token, LexError>`. Every call
//! to `next()` either consumes at least one character or ends the stream
//! (with `EndOfInput` or the first error), so a source of `n` bytes yields at
//! most `n + 1` items.

use crate::features::lexing::domain::{
    Keyword, LexError, LiteralToken, Operator, Token, TokenKind, TypeKeyword,
};
use crate::shared::models::Position;
use unicode_ident::{is_xid_continue, is_xid_start};

/// Lazy, restartable scanner over one source string
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: u32,
    column: u32,
    keep_comments: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            keep_comments: false,
            done: false,
        }
    }

    /// Emit comments as `TokenKind::Comment` instead of skipping them
    pub fn with_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }

    /// Rewind to the start of the source
    pub fn restart(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.column = 1;
        self.done = false;
    }

    /// Byte offset of the next unread character
    pub fn cursor(&self) -> usize {
        self.offset
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Position of the next unread character
    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.bump();
        }
    }

    fn lexeme_from(&self, start: Position) -> &'a str {
        &self.source[start.offset..self.offset]
    }

    /// Scan one item; `Ok(None)` means a skipped comment
    fn scan(&mut self, c: char) -> Result<Option<Token>, LexError> {
        let start = self.current_position();
        match c {
            '-' if self.peek_second() == Some('-') => {
                self.eat_while(|c| c != '\n');
                Ok(self.comment(start))
            }
            '/' if self.peek_second() == Some('*') => self.scan_block_comment(start),
            '"' => self.scan_string(start).map(Some),
            c if c.is_ascii_digit() => self.scan_number(start).map(Some),
            c if is_xid_start(c) || c == '_' => Ok(Some(self.scan_word(start))),
            _ => self.scan_operator(start).map(Some),
        }
    }

    fn comment(&self, start: Position) -> Option<Token> {
        if !self.keep_comments {
            return None;
        }
        let lexeme = self.lexeme_from(start);
        Some(Token::new(
            TokenKind::Comment(lexeme.to_string()),
            lexeme,
            start,
        ))
    }

    fn scan_block_comment(&mut self, start: Position) -> Result<Option<Token>, LexError> {
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some('*') if self.bump_if('/') => return Ok(self.comment(start)),
                Some(_) => {}
                None => return Err(LexError::new(start, "unterminated block comment")),
            }
        }
    }

    fn scan_string(&mut self, start: Position) -> Result<Token, LexError> {
        self.bump();
        let mut value = String::new();
        loop {
            let here = self.current_position();
            match self.bump() {
                Some('"') => break,
                Some('\\') => value.push(self.scan_escape(here)?),
                Some(c) => value.push(c),
                None => return Err(LexError::new(start, "unterminated string literal")),
            }
        }
        Ok(Token::new(
            TokenKind::Literal(LiteralToken::String(value)),
            self.lexeme_from(start),
            start,
        ))
    }

    fn scan_escape(&mut self, at: Position) -> Result<char, LexError> {
        match self.bump() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('u') => {
                if !self.bump_if('{') {
                    return Err(LexError::new(at, "expected '{' after \\u"));
                }
                let digits_start = self.offset;
                self.eat_while(|c| c.is_ascii_hexdigit());
                let digits = &self.source[digits_start..self.offset];
                if digits.is_empty() || digits.len() > 6 || !self.bump_if('}') {
                    return Err(LexError::new(at, "malformed unicode escape"));
                }
                u32::from_str_radix(digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        LexError::new(at, format!("invalid unicode scalar \\u{{{}}}", digits))
                    })
            }
            Some(other) => Err(LexError::new(
                at,
                format!("invalid escape sequence '\\{}'", other),
            )),
            None => Err(LexError::new(at, "unterminated string literal")),
        }
    }

    fn scan_number(&mut self, start: Position) -> Result<Token, LexError> {
        self.eat_while(|c| c.is_ascii_digit());
        let mut is_float = false;

        if self.peek_char() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            let mut rest = self.source[self.offset + 1..].chars();
            let has_exponent = match rest.next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => rest.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                is_float = true;
                self.bump();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.bump();
                }
                self.eat_while(|c| c.is_ascii_digit());
            }
        }

        let lexeme = self.lexeme_from(start);
        let literal = if is_float {
            match lexeme.parse::<f64>() {
                Ok(x) if x.is_finite() => LiteralToken::Float(x),
                _ => {
                    return Err(LexError::new(
                        start,
                        format!("float literal {} out of range", lexeme),
                    ))
                }
            }
        } else {
            let n = lexeme.parse::<u64>().map_err(|_| {
                LexError::new(start, format!("integer literal {} out of range", lexeme))
            })?;
            LiteralToken::Natural(n)
        };
        Ok(Token::new(TokenKind::Literal(literal), lexeme, start))
    }

    fn scan_word(&mut self, start: Position) -> Token {
        self.eat_while(is_xid_continue);
        let word = self.lexeme_from(start);
        let kind = if let Some(ty) = TypeKeyword::lookup(word) {
            TokenKind::TypeKeyword(ty)
        } else if word.eq_ignore_ascii_case("TRUE") {
            TokenKind::Literal(LiteralToken::Boolean(true))
        } else if word.eq_ignore_ascii_case("FALSE") {
            TokenKind::Literal(LiteralToken::Boolean(false))
        } else if word.eq_ignore_ascii_case("NULL") {
            TokenKind::Literal(LiteralToken::Null)
        } else if let Some(keyword) = Keyword::lookup(word) {
            TokenKind::Keyword(keyword)
        } else {
            TokenKind::Identifier(word.to_string())
        };
        Token::new(kind, word, start)
    }

    fn scan_operator(&mut self, start: Position) -> Result<Token, LexError> {
        let c = self.bump().ok_or_else(|| LexError::new(start, "unexpected end of input"))?;
        let op = match c {
            '=' => Operator::Eq,
            '!' if self.bump_if('=') => Operator::NotEq,
            '<' if self.bump_if('=') => Operator::LtEq,
            '<' if self.bump_if('>') => Operator::NotEq,
            '<' => Operator::Lt,
            '>' if self.bump_if('=') => Operator::GtEq,
            '>' => Operator::Gt,
            '|' if self.bump_if('|') => Operator::Concat,
            '+' => Operator::Plus,
            '-' => Operator::Minus,
            '*' => Operator::Star,
            '/' => Operator::Slash,
            '%' => Operator::Percent,
            '^' => Operator::Caret,
            ',' => Operator::Comma,
            '(' => Operator::LParen,
            ')' => Operator::RParen,
            '[' => Operator::LBracket,
            ']' => Operator::RBracket,
            '{' => Operator::LBrace,
            '}' => Operator::RBrace,
            ':' => Operator::Colon,
            ';' => Operator::Semicolon,
            '.' => Operator::Dot,
            other => {
                return Err(LexError::new(
                    start,
                    format!("unexpected character {:?}", other),
                ))
            }
        };
        Ok(Token::new(
            TokenKind::Operator(op),
            self.lexeme_from(start),
            start,
        ))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.eat_while(char::is_whitespace);
            let Some(c) = self.peek_char() else {
                self.done = true;
                let end = self.current_position();
                return Some(Ok(Token::new(TokenKind::EndOfInput, "", end)));
            };
            match self.scan(c) {
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => continue,
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Tokenize a whole source; the last token is always `EndOfInput`
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}
