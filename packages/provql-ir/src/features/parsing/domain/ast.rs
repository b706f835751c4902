//! Abstract syntax tree
//!
//! The AST only guarantees the statement is well-formed. Whether tables,
//! columns and values agree with a schema is the type checker's job.

use crate::shared::models::{format_float, NormalForm, Position, TypeExpr};
use std::fmt;

/// Statement kind, shared with the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Insert,
    Select,
    Update,
    Delete,
    Normalize,
}

impl StatementKind {
    /// Mutations must carry provenance
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Select)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Select => "SELECT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Normalize => "NORMALIZE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert(InsertStatement),
    Select(SelectStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Normalize(NormalizeStatement),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::Insert(_) => StatementKind::Insert,
            Self::Select(_) => StatementKind::Select,
            Self::Update(_) => StatementKind::Update,
            Self::Delete(_) => StatementKind::Delete,
            Self::Normalize(_) => StatementKind::Normalize,
        }
    }

    pub fn table(&self) -> &Ident {
        match self {
            Self::Insert(s) => &s.table,
            Self::Select(s) => &s.table,
            Self::Update(s) => &s.table,
            Self::Delete(s) => &s.table,
            Self::Normalize(s) => &s.table,
        }
    }

    /// Provenance clauses written in the statement (empty for SELECT)
    pub fn provenance(&self) -> Option<&ProvenanceClause> {
        match self {
            Self::Insert(s) => Some(&s.provenance),
            Self::Select(_) => None,
            Self::Update(s) => Some(&s.provenance),
            Self::Delete(s) => Some(&s.provenance),
            Self::Normalize(s) => Some(&s.provenance),
        }
    }
}

/// Name with its source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub position: Position,
}

impl Ident {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `ACTOR "id"` and `RATIONALE "text"` clauses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProvenanceClause {
    pub actor: Option<String>,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: Ident,
    pub assignments: Vec<Assignment>,
    pub provenance: ProvenanceClause,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: Ident,
    pub projection: Projection,
    pub predicate: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: Ident,
    pub assignments: Vec<Assignment>,
    pub predicate: Option<Expr>,
    pub provenance: ProvenanceClause,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: Ident,
    pub predicate: Expr,
    pub provenance: ProvenanceClause,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeStatement {
    pub table: Ident,
    pub target: Option<NormalForm>,
    pub provenance: ProvenanceClause,
}

/// `col = value [: TypeExpr]`
///
/// With an annotation the assignment is in the explicit-typed dialect,
/// without one the type checker infers the literal's type.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Ident,
    pub value: Expr,
    pub annotation: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<Ident>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: Ident,
    pub direction: SortDirection,
}

/// Literal as written (before type resolution)
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Natural(u64),
    /// Negative integer (a natural under unary minus)
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Vector(Vec<Literal>),
    /// `{name: value, ...}` in source order
    Record(Vec<(String, Literal)>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Natural(n) => write!(f, "{}", n),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Null => f.write_str("NULL"),
            Self::Vector(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Neg => "-",
            Self::Plus => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Concat => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::Gt | Self::LtEq | Self::GtEq
        )
    }

    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::LtEq | Self::GtEq)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod | Self::Pow
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expression tree (WHERE predicates and assignment values)
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(Ident),
    Literal {
        value: Literal,
        position: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        position: Position,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        position: Position,
    },
    IsNull {
        operand: Box<Expr>,
        negated: bool,
        position: Position,
    },
}

impl Expr {
    pub fn literal(value: Literal, position: Position) -> Self {
        Self::Literal { value, position }
    }

    /// Position of the expression's operator or leaf
    pub fn position(&self) -> Position {
        match self {
            Self::Column(ident) => ident.position,
            Self::Literal { position, .. }
            | Self::Unary { position, .. }
            | Self::Binary { position, .. }
            | Self::IsNull { position, .. } => *position,
        }
    }

    /// Columns referenced anywhere in the expression
    pub fn columns(&self) -> Vec<&Ident> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Ident>) {
        match self {
            Self::Column(ident) => out.push(ident),
            Self::Literal { .. } => {}
            Self::Unary { operand, .. } | Self::IsNull { operand, .. } => {
                operand.collect_columns(out)
            }
            Self::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(ident) => write!(f, "{}", ident),
            Self::Literal { value, .. } => write!(f, "{}", value),
            Self::Unary {
                op: UnaryOp::Not,
                operand,
                ..
            } => write!(f, "(NOT {})", operand),
            Self::Unary { op, operand, .. } => write!(f, "({}{})", op.as_str(), operand),
            Self::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op, right),
            Self::IsNull {
                operand, negated, ..
            } => write!(
                f,
                "({} IS {}NULL)",
                operand,
                if *negated { "NOT " } else { "" }
            ),
        }
    }
}
