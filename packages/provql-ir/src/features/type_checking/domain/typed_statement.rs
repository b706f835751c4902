//! Type-checked statements
//!
//! Every value in a `TypedStatement` is a `TypedValue` at its column's
//! declared type, so lowering never re-checks refinements.

use crate::features::parsing::{BinaryOp, ProvenanceClause, SortDirection, StatementKind, UnaryOp};
use crate::features::smt::VerificationMethod;
use crate::shared::models::{format_float, NormalForm, Position, TypeExpr, TypedValue, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an assignment's type was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `col = value : TypeExpr`
    Explicit,
    /// Bare literal resolved against the column type
    Inferred,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Inferred => "inferred",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedAssignment {
    pub column: String,
    pub value: TypedValue,
    pub dialect: Dialect,
    pub method: VerificationMethod,
    pub evidence: String,
    pub position: Position,
}

/// Resolved column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedOrderBy {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// Typed WHERE expression
///
/// Literals carry the base type they were coerced to; column references keep
/// the declared (possibly refined) type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedExpr {
    Column(ColumnRef),
    Literal {
        value: Value,
        ty: TypeExpr,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TypedExpr>,
        ty: TypeExpr,
    },
    Binary {
        op: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
        ty: TypeExpr,
    },
    IsNull {
        operand: Box<TypedExpr>,
        negated: bool,
    },
}

impl TypedExpr {
    pub fn ty(&self) -> TypeExpr {
        match self {
            Self::Column(column) => column.ty.clone(),
            Self::Literal { ty, .. } | Self::Unary { ty, .. } | Self::Binary { ty, .. } => ty.clone(),
            Self::IsNull { .. } => TypeExpr::Bool,
        }
    }

    /// Columns referenced anywhere in the expression
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Self::Column(column) => out.push(column),
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

impl fmt::Display for TypedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => f.write_str(&column.name),
            Self::Literal {
                value: Value::Float(x),
                ..
            } => f.write_str(&format_float(*x)),
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

#[derive(Debug, Clone, PartialEq)]
pub struct TypedStatement {
    pub kind: StatementKind,
    pub table: String,
    pub assignments: Vec<TypedAssignment>,
    /// Selected columns (`*` expanded in schema order); for DELETE every
    /// column of the removed rows; empty for the other mutations
    pub projection: Vec<ColumnRef>,
    pub predicate: Option<TypedExpr>,
    pub order_by: Vec<TypedOrderBy>,
    pub limit: Option<u64>,
    pub normal_form: Option<NormalForm>,
    pub provenance: ProvenanceClause,
    /// Non-fatal findings such as predicates a refinement makes unsatisfiable
    pub warnings: Vec<String>,
}

impl TypedStatement {
    pub(crate) fn empty(kind: StatementKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            assignments: Vec::new(),
            projection: Vec::new(),
            predicate: None,
            order_by: Vec::new(),
            limit: None,
            normal_form: None,
            provenance: ProvenanceClause::default(),
            warnings: Vec::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        if self
            .assignments
            .iter()
            .any(|a| a.dialect == Dialect::Inferred)
        {
            Dialect::Inferred
        } else {
            Dialect::Explicit
        }
    }
}
