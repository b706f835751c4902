//! Parsing domain models

mod ast;
mod error;

pub use ast::{
    Assignment, BinaryOp, DeleteStatement, Expr, Ident, InsertStatement, Literal,
    NormalizeStatement, OrderBy, Projection, ProvenanceClause, SelectStatement, SortDirection,
    Statement, StatementKind, UnaryOp, UpdateStatement,
};
pub use error::{ParseError, SyntaxError};
