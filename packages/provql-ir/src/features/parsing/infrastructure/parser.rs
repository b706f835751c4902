//! Statement parser
//!
//! Recursive descent for statements, precedence climbing for expressions.
//! Parsing is fail-fast: the first unexpected token ends the statement.

use super::token_stream::{Combinators, ParseResult, TokenStream};
use crate::features::lexing::{Keyword, LiteralToken, Operator, Token, TokenKind, TypeKeyword};
use crate::features::parsing::domain::{
    Assignment, BinaryOp, DeleteStatement, Expr, Ident, InsertStatement, Literal,
    NormalizeStatement, OrderBy, ParseError, Projection, ProvenanceClause, SelectStatement,
    SortDirection, Statement, UnaryOp, UpdateStatement,
};
use crate::shared::models::{NormalForm, Position, TypeExpr};
use std::ops::Add;

/// Default bound on expression/literal nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

pub struct Parser {
    stream: TokenStream,
    max_depth: usize,
    depth: usize,
}

impl Combinators for Parser {
    fn tokens(&mut self) -> &mut TokenStream {
        &mut self.stream
    }
}

impl Parser {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            stream: TokenStream::new(tokens),
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Parse exactly one statement, optionally followed by `;`
    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let leading = self.stream.peek().kind.clone();
        let statement = match leading {
            TokenKind::Keyword(Keyword::Insert) => Statement::Insert(self.parse_insert()?),
            TokenKind::Keyword(Keyword::Select) => Statement::Select(self.parse_select()?),
            TokenKind::Keyword(Keyword::Update) => Statement::Update(self.parse_update()?),
            TokenKind::Keyword(Keyword::Delete) => Statement::Delete(self.parse_delete()?),
            TokenKind::Keyword(Keyword::Normalize) => {
                Statement::Normalize(self.parse_normalize()?)
            }
            _ => {
                return Err(self
                    .stream
                    .unexpected(["INSERT", "SELECT", "UPDATE", "DELETE", "NORMALIZE"]))
            }
        };
        self.stream.next_if_operator(Operator::Semicolon);
        if !self.stream.is_at_end() {
            return Err(self.stream.unexpected(["end of statement"]));
        }
        Ok(statement)
    }

    /// Parse a type expression that spans the whole input
    pub fn parse_standalone_type(&mut self) -> ParseResult<TypeExpr> {
        let ty = self.parse_type_expr()?;
        if !self.stream.is_at_end() {
            return Err(self.stream.unexpected(["end of type"]));
        }
        Ok(ty)
    }

    // ── statements ──────────────────────────────────────────────────────

    fn parse_insert(&mut self) -> ParseResult<InsertStatement> {
        self.stream.expect_keyword(Keyword::Insert)?;
        self.stream.expect_keyword(Keyword::Into)?;
        let table = self.parse_ident()?;
        self.stream.expect_keyword(Keyword::Set)?;
        let assignments = self.parse_assignments()?;
        let provenance = self.parse_provenance()?;
        Ok(InsertStatement {
            table,
            assignments,
            provenance,
        })
    }

    fn parse_select(&mut self) -> ParseResult<SelectStatement> {
        self.stream.expect_keyword(Keyword::Select)?;
        let projection = if self.stream.next_if_operator(Operator::Star) {
            Projection::All
        } else {
            Projection::Columns(self.sep_by(Operator::Comma, Self::parse_ident)?)
        };
        self.stream.expect_keyword(Keyword::From)?;
        let table = self.parse_ident()?;
        let predicate = self.parse_where()?;

        let mut order_by = Vec::new();
        if self.stream.next_if_keyword(Keyword::Order) {
            self.stream.expect_keyword(Keyword::By)?;
            order_by = self.stream.sep_by(Operator::Comma, |s| {
                let column = Self::ident_from(s)?;
                let direction = if s.next_if_keyword(Keyword::Desc) {
                    SortDirection::Desc
                } else {
                    s.next_if_keyword(Keyword::Asc);
                    SortDirection::Asc
                };
                Ok(OrderBy { column, direction })
            })?;
        }

        let limit = self.stream.optional(|s| {
            s.expect_keyword(Keyword::Limit)?;
            s.expect("natural number", |t| match t.kind {
                TokenKind::Literal(LiteralToken::Natural(n)) => Some(n),
                _ => None,
            })
        })?;

        Ok(SelectStatement {
            table,
            projection,
            predicate,
            order_by,
            limit,
        })
    }

    fn parse_update(&mut self) -> ParseResult<UpdateStatement> {
        self.stream.expect_keyword(Keyword::Update)?;
        let table = self.parse_ident()?;
        self.stream.expect_keyword(Keyword::Set)?;
        let assignments = self.parse_assignments()?;
        let predicate = self.parse_where()?;
        let provenance = self.parse_provenance()?;
        self.require_rationale(&provenance, "UPDATE")?;
        Ok(UpdateStatement {
            table,
            assignments,
            predicate,
            provenance,
        })
    }

    fn parse_delete(&mut self) -> ParseResult<DeleteStatement> {
        self.stream.expect_keyword(Keyword::Delete)?;
        self.stream.expect_keyword(Keyword::From)?;
        let table = self.parse_ident()?;
        let predicate = match self.parse_where()? {
            Some(predicate) => predicate,
            None => {
                return Err(self
                    .stream
                    .unexpected(["WHERE"])
                    .with_message("WHERE clause required for DELETE"))
            }
        };
        let provenance = self.parse_provenance()?;
        self.require_rationale(&provenance, "DELETE")?;
        Ok(DeleteStatement {
            table,
            predicate,
            provenance,
        })
    }

    fn parse_normalize(&mut self) -> ParseResult<NormalizeStatement> {
        self.stream.expect_keyword(Keyword::Normalize)?;
        let table = self.parse_ident()?;
        let target = if self.stream.next_if_keyword(Keyword::To) {
            Some(self.parse_normal_form()?)
        } else {
            None
        };
        let provenance = self.parse_provenance()?;
        self.require_rationale(&provenance, "NORMALIZE")?;
        Ok(NormalizeStatement {
            table,
            target,
            provenance,
        })
    }

    /// `1NF` lexes as a number followed by `NF`; `BCNF` is an identifier
    fn parse_normal_form(&mut self) -> ParseResult<NormalForm> {
        let start = self.stream.peek().clone();
        let text = match &start.kind {
            TokenKind::Literal(LiteralToken::Natural(n)) => {
                self.stream.advance();
                let suffix = self.stream.peek().clone();
                let adjacent = suffix.position.offset == start.end_offset();
                match &suffix.kind {
                    TokenKind::Identifier(s) if adjacent && s.eq_ignore_ascii_case("NF") => {
                        self.stream.advance();
                        format!("{}NF", n)
                    }
                    _ => return Err(self.stream.unexpected(["NF"])),
                }
            }
            TokenKind::Identifier(name) => {
                self.stream.advance();
                name.clone()
            }
            TokenKind::Literal(LiteralToken::String(s)) => {
                self.stream.advance();
                s.clone()
            }
            _ => return Err(self.stream.unexpected(["1NF", "2NF", "3NF", "BCNF"])),
        };
        text.parse().map_err(|reason: String| {
            ParseError::expected(start.position, ["1NF", "2NF", "3NF", "BCNF"], text.clone())
                .with_message(reason)
        })
    }

    fn parse_where(&mut self) -> ParseResult<Option<Expr>> {
        self.optional(|p| {
            p.stream.expect_keyword(Keyword::Where)?;
            p.parse_expression()
        })
    }

    /// `[ACTOR "id"] [RATIONALE "text"]`, in that order, each at most once
    fn parse_provenance(&mut self) -> ParseResult<ProvenanceClause> {
        let clauses = self.stream.many(|s| {
            let position = s.position();
            let keyword = s.expect("ACTOR or RATIONALE", |t| match t.kind {
                TokenKind::Keyword(k @ (Keyword::Actor | Keyword::Rationale)) => Some(k),
                _ => None,
            })?;
            let what = if keyword == Keyword::Actor { "actor id" } else { "rationale text" };
            Ok((keyword, Self::string_from(s, what)?, position))
        })?;

        let mut clause = ProvenanceClause::default();
        for (keyword, text, position) in clauses {
            let slot = match keyword {
                Keyword::Actor if clause.rationale.is_some() => {
                    return Err(ParseError::expected(position, ["end of statement"], "ACTOR")
                        .with_message("ACTOR must precede RATIONALE"))
                }
                Keyword::Actor => &mut clause.actor,
                _ => &mut clause.rationale,
            };
            if slot.is_some() {
                return Err(ParseError::expected(position, ["end of statement"], keyword.as_str())
                    .with_message(format!("duplicate {} clause", keyword)));
            }
            *slot = Some(text);
        }
        Ok(clause)
    }

    fn require_rationale(&self, clause: &ProvenanceClause, statement: &str) -> ParseResult<()> {
        if clause.rationale.is_some() {
            return Ok(());
        }
        Err(self
            .stream
            .unexpected(["RATIONALE"])
            .with_message(format!("RATIONALE clause required for {}", statement)))
    }

    fn string_from(stream: &mut TokenStream, what: &str) -> ParseResult<String> {
        stream.expect(what, |t| match &t.kind {
            TokenKind::Literal(LiteralToken::String(s)) => Some(s.clone()),
            _ => None,
        })
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        Self::ident_from(&mut self.stream)
    }

    fn ident_from(stream: &mut TokenStream) -> ParseResult<Ident> {
        stream.expect("identifier", |t| match &t.kind {
            TokenKind::Identifier(name) => Some(Ident::new(name.clone(), t.position)),
            _ => None,
        })
    }

    fn parse_assignments(&mut self) -> ParseResult<Vec<Assignment>> {
        self.sep_by(Operator::Comma, Self::parse_assignment)
    }

    fn parse_assignment(&mut self) -> ParseResult<Assignment> {
        let column = self.parse_ident()?;
        self.stream.expect_operator(Operator::Eq)?;
        let value = self.parse_expression()?;
        let annotation = self.optional(|p| {
            p.stream.expect_operator(Operator::Colon)?;
            p.parse_type_expr()
        })?;
        Ok(Assignment {
            column,
            value,
            annotation,
        })
    }

    // ── types ───────────────────────────────────────────────────────────

    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        self.enter()?;
        let keyword = self.stream.expect("type", |t| match t.kind {
            TokenKind::TypeKeyword(k) => Some(k),
            _ => None,
        })?;
        let ty = match keyword {
            TypeKeyword::Nat => TypeExpr::Nat,
            TypeKeyword::Int => TypeExpr::Int,
            TypeKeyword::String => TypeExpr::String,
            TypeKeyword::Bool => TypeExpr::Bool,
            TypeKeyword::Float => TypeExpr::Float,
            TypeKeyword::Uuid => TypeExpr::Uuid,
            TypeKeyword::Timestamp => TypeExpr::Timestamp,
            TypeKeyword::NonEmptyString => TypeExpr::NonEmptyString,
            TypeKeyword::Confidence => TypeExpr::Confidence,
            TypeKeyword::PromptScores => TypeExpr::PromptScores,
            TypeKeyword::BoundedNat => {
                self.stream.expect_operator(Operator::LParen)?;
                let min = self.parse_natural()?;
                self.stream.expect_operator(Operator::Comma)?;
                let max = self.parse_natural()?;
                self.stream.expect_operator(Operator::RParen)?;
                TypeExpr::bounded_nat(min, max)
            }
            TypeKeyword::BoundedFloat => {
                self.stream.expect_operator(Operator::LParen)?;
                let min = self.parse_signed_number()?;
                self.stream.expect_operator(Operator::Comma)?;
                let max = self.parse_signed_number()?;
                self.stream.expect_operator(Operator::RParen)?;
                TypeExpr::bounded_float(min, max)
            }
            TypeKeyword::Vector => {
                self.stream.expect_operator(Operator::LParen)?;
                let element = self.parse_type_expr()?;
                self.stream.expect_operator(Operator::Comma)?;
                let len = self.parse_natural()?;
                self.stream.expect_operator(Operator::RParen)?;
                let len = usize::try_from(len).map_err(|_| {
                    self.stream
                        .unexpected(["vector length"])
                        .with_message("vector length out of range")
                })?;
                TypeExpr::vector(element, len)
            }
        };
        self.leave();
        Ok(ty)
    }

    fn parse_natural(&mut self) -> ParseResult<u64> {
        self.stream.expect("natural number", |t| match t.kind {
            TokenKind::Literal(LiteralToken::Natural(n)) => Some(n),
            _ => None,
        })
    }

    fn parse_signed_number(&mut self) -> ParseResult<f64> {
        let negative = self.stream.next_if_operator(Operator::Minus);
        if !negative {
            self.stream.next_if_operator(Operator::Plus);
        }
        let magnitude = self.stream.expect("number", |t| match t.kind {
            TokenKind::Literal(LiteralToken::Natural(n)) => Some(n as f64),
            TokenKind::Literal(LiteralToken::Float(x)) => Some(x),
            _ => None,
        })?;
        Ok(if negative { -magnitude } else { magnitude })
    }

    // ── expressions ─────────────────────────────────────────────────────

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.stream.unexpected(["shallower expression"]).with_message(
                format!("nesting exceeds the limit of {} levels", self.max_depth),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_expression_at(0)
    }

    fn parse_expression_at(&mut self, min_precedence: Precedence) -> ParseResult<Expr> {
        self.enter()?;
        let mut lhs = if let Some((prefix, position)) = self.parse_prefix_operator_at(min_precedence)
        {
            let rhs = self.parse_expression_at(prefix.precedence() + Associativity::Right)?;
            prefix.into_expression(rhs, position)
        } else {
            self.parse_expression_atom()?
        };

        while let Some(postfix) = self.parse_postfix_operator_at(min_precedence)? {
            lhs = postfix.into_expression(lhs);
        }

        while let Some((infix, position)) = self.parse_infix_operator_at(min_precedence) {
            let rhs = self.parse_expression_at(infix.precedence() + infix.associativity())?;
            lhs = infix.into_expression(lhs, rhs, position);
        }

        while let Some(postfix) = self.parse_postfix_operator_at(min_precedence)? {
            lhs = postfix.into_expression(lhs);
        }

        self.leave();
        Ok(lhs)
    }

    fn parse_expression_atom(&mut self) -> ParseResult<Expr> {
        let token = self.stream.peek().clone();
        match &token.kind {
            TokenKind::Identifier(name) => {
                self.stream.advance();
                Ok(Expr::Column(Ident::new(name.clone(), token.position)))
            }
            TokenKind::Operator(Operator::LParen) => {
                self.stream.advance();
                let inner = self.parse_expression()?;
                self.stream.expect_operator(Operator::RParen)?;
                Ok(inner)
            }
            TokenKind::Literal(_)
            | TokenKind::Operator(Operator::LBracket)
            | TokenKind::Operator(Operator::LBrace) => {
                let value = self.parse_literal()?;
                Ok(Expr::literal(value, token.position))
            }
            _ => Err(self.stream.unexpected(["expression"])),
        }
    }

    /// Literal, including vector and record literals (elements may be signed)
    fn parse_literal(&mut self) -> ParseResult<Literal> {
        self.enter()?;
        let token = self.stream.advance();
        let literal = match token.kind {
            TokenKind::Literal(LiteralToken::Natural(n)) => Literal::Natural(n),
            TokenKind::Literal(LiteralToken::Float(x)) => Literal::Float(x),
            TokenKind::Literal(LiteralToken::String(s)) => Literal::String(s),
            TokenKind::Literal(LiteralToken::Boolean(b)) => Literal::Boolean(b),
            TokenKind::Literal(LiteralToken::Null) => Literal::Null,
            TokenKind::Operator(Operator::Minus) => {
                let operand = self.parse_literal()?;
                negate_literal(operand).ok_or_else(|| {
                    ParseError::expected(token.position, ["number"], "'-'")
                        .with_message("only numbers can be negated")
                })?
            }
            TokenKind::Operator(Operator::Plus) => match self.parse_literal()? {
                number @ (Literal::Natural(_) | Literal::Integer(_) | Literal::Float(_)) => number,
                _ => {
                    return Err(ParseError::expected(token.position, ["number"], "'+'")
                        .with_message("only numbers can take a sign"))
                }
            },
            TokenKind::Operator(Operator::LBracket) => {
                let items = if self.stream.next_if_operator(Operator::RBracket) {
                    Vec::new()
                } else {
                    let items = self.sep_by(Operator::Comma, Self::parse_literal)?;
                    self.stream.expect_operator(Operator::RBracket)?;
                    items
                };
                Literal::Vector(items)
            }
            TokenKind::Operator(Operator::LBrace) => {
                let fields = self.sep_by(Operator::Comma, |p| {
                    let name = p.parse_ident()?;
                    p.stream.expect_operator(Operator::Colon)?;
                    Ok((name.name, p.parse_literal()?))
                })?;
                self.stream.expect_operator(Operator::RBrace)?;
                Literal::Record(fields)
            }
            other => {
                return Err(ParseError::expected(
                    token.position,
                    ["literal"],
                    other.describe(),
                ))
            }
        };
        self.leave();
        Ok(literal)
    }

    fn parse_prefix_operator_at(
        &mut self,
        min_precedence: Precedence,
    ) -> Option<(PrefixOperator, Position)> {
        self.stream.next_if_map(|token| {
            let operator = match token.kind {
                TokenKind::Keyword(Keyword::Not) => PrefixOperator::Not,
                TokenKind::Operator(Operator::Minus) => PrefixOperator::Minus,
                TokenKind::Operator(Operator::Plus) => PrefixOperator::Plus,
                _ => return None,
            };
            Some((operator, token.position)).filter(|(op, _)| op.precedence() >= min_precedence)
        })
    }

    fn parse_infix_operator_at(
        &mut self,
        min_precedence: Precedence,
    ) -> Option<(InfixOperator, Position)> {
        self.stream.next_if_map(|token| {
            let operator = match token.kind {
                TokenKind::Keyword(Keyword::Or) => InfixOperator(BinaryOp::Or),
                TokenKind::Keyword(Keyword::And) => InfixOperator(BinaryOp::And),
                TokenKind::Operator(Operator::Eq) => InfixOperator(BinaryOp::Eq),
                TokenKind::Operator(Operator::NotEq) => InfixOperator(BinaryOp::NotEq),
                TokenKind::Operator(Operator::Lt) => InfixOperator(BinaryOp::Lt),
                TokenKind::Operator(Operator::Gt) => InfixOperator(BinaryOp::Gt),
                TokenKind::Operator(Operator::LtEq) => InfixOperator(BinaryOp::LtEq),
                TokenKind::Operator(Operator::GtEq) => InfixOperator(BinaryOp::GtEq),
                TokenKind::Operator(Operator::Concat) => InfixOperator(BinaryOp::Concat),
                TokenKind::Operator(Operator::Plus) => InfixOperator(BinaryOp::Add),
                TokenKind::Operator(Operator::Minus) => InfixOperator(BinaryOp::Sub),
                TokenKind::Operator(Operator::Star) => InfixOperator(BinaryOp::Mul),
                TokenKind::Operator(Operator::Slash) => InfixOperator(BinaryOp::Div),
                TokenKind::Operator(Operator::Percent) => InfixOperator(BinaryOp::Mod),
                TokenKind::Operator(Operator::Caret) => InfixOperator(BinaryOp::Pow),
                _ => return None,
            };
            Some((operator, token.position)).filter(|(op, _)| op.precedence() >= min_precedence)
        })
    }

    /// `IS [NOT] NULL` spans several tokens, so the precedence is checked
    /// before anything is consumed
    fn parse_postfix_operator_at(
        &mut self,
        min_precedence: Precedence,
    ) -> ParseResult<Option<PostfixOperator>> {
        if !self.stream.peek().is_keyword(Keyword::Is) || POSTFIX_PRECEDENCE < min_precedence {
            return Ok(None);
        }
        let position = self.stream.advance().position;
        let negated = self.stream.next_if_keyword(Keyword::Not);
        self.stream.expect("NULL", |t| {
            matches!(t.kind, TokenKind::Literal(LiteralToken::Null)).then_some(())
        })?;
        Ok(Some(PostfixOperator { negated, position }))
    }
}

fn negate_literal(literal: Literal) -> Option<Literal> {
    match literal {
        Literal::Natural(n) => {
            if n == 0 {
                Some(Literal::Natural(0))
            } else if n - 1 <= i64::MAX as u64 {
                Some(Literal::Integer((-((n - 1) as i64)) - 1))
            } else {
                None
            }
        }
        Literal::Integer(i) => Some(match i.checked_neg() {
            Some(v) if v >= 0 => Literal::Natural(v as u64),
            Some(v) => Literal::Integer(v),
            None => Literal::Natural(i.unsigned_abs()),
        }),
        Literal::Float(x) => Some(Literal::Float(-x)),
        _ => None,
    }
}

/// Operator precedence
type Precedence = u8;

const POSTFIX_PRECEDENCE: Precedence = 11;

/// Operator associativity
enum Associativity {
    Left,
    Right,
}

impl Add<Associativity> for Precedence {
    type Output = Self;

    fn add(self, rhs: Associativity) -> Self {
        // Left-associative operators bind tighter to their left-hand side
        self + match rhs {
            Associativity::Left => 1,
            Associativity::Right => 0,
        }
    }
}

enum PrefixOperator {
    Not,
    Minus,
    Plus,
}

impl PrefixOperator {
    fn precedence(&self) -> Precedence {
        match self {
            Self::Not => 3,
            Self::Minus | Self::Plus => 10,
        }
    }

    fn into_expression(
        self,
        operand: Expr,
        position: Position,
    ) -> Expr {
        let op = match self {
            Self::Not => UnaryOp::Not,
            Self::Minus => UnaryOp::Neg,
            Self::Plus => UnaryOp::Plus,
        };
        Expr::Unary {
            op,
            operand: Box::new(operand),
            position,
        }
    }
}

struct InfixOperator(BinaryOp);

impl InfixOperator {
    fn precedence(&self) -> Precedence {
        match self.0 {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            // NOT => 3
            BinaryOp::Eq | BinaryOp::NotEq => 4,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => 5,
            BinaryOp::Concat => 6,
            BinaryOp::Add | BinaryOp::Sub => 7,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 8,
            BinaryOp::Pow => 9,
        }
    }

    fn associativity(&self) -> Associativity {
        match self.0 {
            BinaryOp::Pow => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    fn into_expression(
        self,
        left: Expr,
        right: Expr,
        position: Position,
    ) -> Expr {
        Expr::Binary {
            op: self.0,
            left: Box::new(left),
            right: Box::new(right),
            position,
        }
    }
}

struct PostfixOperator {
    negated: bool,
    position: Position,
}

impl PostfixOperator {
    fn into_expression(self, operand: Expr) -> Expr {
        Expr::IsNull {
            operand: Box::new(operand),
            negated: self.negated,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lexing::tokenize;

    fn parse(source: &str) -> ParseResult<Statement> {
        Parser::new(tokenize(source).unwrap()).parse_statement()
    }

    fn expr(source: &str) -> String {
        match parse(&format!("SELECT * FROM t WHERE {}", source)).unwrap() {
            Statement::Select(s) => s.predicate.unwrap().to_string(),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_insert_inferred_and_explicit() {
        let stmt = parse(
            r#"INSERT INTO evidence SET title = "ONS Data", prompt_provenance = 87 : BoundedNat(0, 100) ACTOR "alice" RATIONALE "official stats""#,
        )
        .unwrap();
        let Statement::Insert(insert) = stmt else {
            panic!("expected insert");
        };
        assert_eq!(insert.table.name, "evidence");
        assert_eq!(insert.assignments.len(), 2);
        assert_eq!(insert.assignments[0].annotation, None);
        assert_eq!(
            insert.assignments[1].annotation,
            Some(TypeExpr::bounded_nat(0, 100))
        );
        assert_eq!(insert.provenance.actor.as_deref(), Some("alice"));
        assert_eq!(insert.provenance.rationale.as_deref(), Some("official stats"));
    }

    #[test]
    fn test_insert_without_provenance_parses() {
        let stmt = parse("INSERT INTO evidence SET score = 42").unwrap();
        assert_eq!(stmt.provenance(), Some(&ProvenanceClause::default()));
    }

    #[test]
    fn test_delete_requires_where() {
        let err = parse("DELETE FROM evidence").unwrap_err();
        assert_eq!(err.message.as_deref(), Some("WHERE clause required for DELETE"));
        assert_eq!(err.expected, vec!["WHERE"]);
        assert_eq!(err.found, "end of input");
        assert_eq!(err.position, Position::new(1, 21, 20));
    }

    #[test]
    fn test_delete_and_update_require_rationale() {
        let err = parse("DELETE FROM evidence WHERE score < 3").unwrap_err();
        assert_eq!(err.message.as_deref(), Some("RATIONALE clause required for DELETE"));
        let err = parse("UPDATE evidence SET score = 1").unwrap_err();
        assert_eq!(err.message.as_deref(), Some("RATIONALE clause required for UPDATE"));
        assert!(parse(r#"UPDATE evidence SET score = 1 RATIONALE "fix""#).is_ok());
    }

    #[test]
    fn test_provenance_clause_order() {
        let err = parse(r#"INSERT INTO evidence SET score = 1 RATIONALE "r" ACTOR "a""#).unwrap_err();
        assert_eq!(err.message.as_deref(), Some("ACTOR must precede RATIONALE"));
        assert_eq!(err.position.column, 50);

        let err = parse(r#"INSERT INTO evidence SET score = 1 ACTOR "a" ACTOR "b""#).unwrap_err();
        assert_eq!(err.message.as_deref(), Some("duplicate ACTOR clause"));

        let err = parse("INSERT INTO evidence SET score = 1 ACTOR 7").unwrap_err();
        assert_eq!(err.expected, vec!["actor id"]);
    }

    #[test]
    fn test_comma_lists() {
        let stmt = parse(
            r#"INSERT INTO evidence SET v = [1, 2, 3] : Vector(Nat, 3), s = {structure: 1, context: 2}, n = 4"#,
        )
        .unwrap();
        let Statement::Insert(insert) = stmt else {
            panic!("expected insert");
        };
        assert_eq!(insert.assignments.len(), 3);
        assert_eq!(insert.assignments[0].annotation, Some(TypeExpr::vector(TypeExpr::Nat, 3)));
        assert_eq!(insert.assignments[1].annotation, None);

        // a trailing comma is an error, not an empty item
        let err = parse("INSERT INTO evidence SET a = 1,").unwrap_err();
        assert_eq!(err.expected, vec!["identifier"]);
        assert!(parse("SELECT * FROM t WHERE v = [1, ]").is_err());
    }

    #[test]
    fn test_select_clauses() {
        let stmt = parse(
            "SELECT title, score FROM evidence WHERE score >= 10 ORDER BY score DESC, title LIMIT 5;",
        )
        .unwrap();
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert!(matches!(select.projection, Projection::Columns(ref c) if c.len() == 2));
        assert_eq!(select.order_by.len(), 2);
        assert_eq!(select.order_by[0].direction, SortDirection::Desc);
        assert_eq!(select.order_by[1].direction, SortDirection::Asc);
        assert_eq!(select.limit, Some(5));
    }

    #[test]
    fn test_limit_requires_natural() {
        let err = parse("SELECT * FROM t LIMIT 2.5").unwrap_err();
        assert_eq!(err.expected, vec!["natural number"]);
    }

    #[test]
    fn test_normalize() {
        let stmt = parse(r#"NORMALIZE evidence TO 3NF RATIONALE "dedupe sources""#).unwrap();
        let Statement::Normalize(n) = stmt else {
            panic!("expected normalize");
        };
        assert_eq!(n.target, Some(NormalForm::Third));
        let stmt = parse(r#"NORMALIZE evidence TO BCNF RATIONALE "x""#).unwrap();
        assert!(matches!(stmt, Statement::Normalize(ref n) if n.target == Some(NormalForm::BoyceCodd)));
        assert!(parse(r#"NORMALIZE evidence TO 3 NF RATIONALE "x""#).is_err());
    }

    #[test]
    fn test_precedence() {
        assert_eq!(expr("a = 1 OR b = 2 AND c = 3"), "((a = 1) OR ((b = 2) AND (c = 3)))");
        assert_eq!(expr("NOT a = 1"), "(NOT (a = 1))");
        assert_eq!(expr("a + 2 * 3 > 4"), "((a + (2 * 3)) > 4)");
        assert_eq!(expr("a = 2 ^ 3 ^ 2"), "(a = (2 ^ (3 ^ 2)))");
        assert_eq!(expr("a - 1 - 2 = 0"), "(((a - 1) - 2) = 0)");
        assert_eq!(expr("a || b = c"), "((a || b) = c)");
        assert_eq!(expr("-a < 3"), "((-a) < 3)");
        assert_eq!(expr("a IS NOT NULL AND b IS NULL"), "((a IS NOT NULL) AND (b IS NULL))");
        assert_eq!(expr("(a = 1 OR b = 2) AND c = 3"), "(((a = 1) OR (b = 2)) AND (c = 3))");
    }

    #[test]
    fn test_literals() {
        let stmt = parse(
            "INSERT INTO t SET v = [0.1, -2, 3], s = {structure: 1, context: 2, evidence: 3, reasoning: 4, clarity: 5}",
        )
        .unwrap();
        let Statement::Insert(insert) = stmt else {
            panic!("expected insert");
        };
        assert_eq!(
            insert.assignments[0].value,
            Expr::literal(
                Literal::Vector(vec![
                    Literal::Float(0.1),
                    Literal::Integer(-2),
                    Literal::Natural(3)
                ]),
                Position::new(1, 23, 22)
            )
        );
        assert!(matches!(
            &insert.assignments[1].value,
            Expr::Literal { value: Literal::Record(fields), .. } if fields.len() == 5
        ));
    }

    #[test]
    fn test_negate_literal_bounds() {
        assert_eq!(
            negate_literal(Literal::Natural(9_223_372_036_854_775_808)),
            Some(Literal::Integer(i64::MIN))
        );
        assert_eq!(negate_literal(Literal::Natural(u64::MAX)), None);
        assert_eq!(negate_literal(Literal::Integer(-4)), Some(Literal::Natural(4)));
    }

    #[test]
    fn test_type_expressions() {
        let ty = Parser::new(tokenize("Vector(BoundedFloat(-1, 2.5), 3)").unwrap())
            .parse_standalone_type()
            .unwrap();
        assert_eq!(ty, TypeExpr::vector(TypeExpr::bounded_float(-1.0, 2.5), 3));
        assert!(Parser::new(tokenize("BoundedNat(0)").unwrap())
            .parse_standalone_type()
            .is_err());
    }

    #[test]
    fn test_depth_limit() {
        let nested = format!("SELECT * FROM t WHERE {}a = 1{}", "(".repeat(100), ")".repeat(100));
        let err = Parser::new(tokenize(&nested).unwrap())
            .with_max_depth(32)
            .parse_statement()
            .unwrap_err();
        assert!(err.reason().contains("limit of 32"));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse("SELECT * FROM t t2").unwrap_err();
        assert_eq!(err.expected, vec!["end of statement"]);
    }

    #[test]
    fn test_unknown_statement() {
        let err = parse("MERGE INTO t").unwrap_err();
        assert_eq!(err.expected.len(), 5);
        assert_eq!(err.found, "identifier 'MERGE'");
    }
}
