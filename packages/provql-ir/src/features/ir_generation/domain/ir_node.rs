//! IR node - the terminal artifact of a compile
//!
//! Rows hold `TypedValue`s at their column's declared type together with the
//! proof of how each value was verified. Mutation nodes always carry a
//! `ProvenanceRecord`.

use crate::features::parsing::{BinaryOp, SortDirection, StatementKind, UnaryOp};
use crate::features::smt::VerificationMethod;
use crate::features::type_checking::Dialect;
use crate::shared::models::{NormalForm, ProvenanceRecord, TypeCategory, TypeExpr, TypedValue};
use std::collections::BTreeSet;
use std::fmt;

/// Audit record of how one value's refinement was established
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBlob {
    pub kind: VerificationMethod,
    pub category: TypeCategory,
    /// Checked predicate plus a fingerprint of the value
    pub payload: String,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IRRow {
    pub column: String,
    pub value: TypedValue,
    pub proof: ProofBlob,
    pub dialect: Dialect,
}

/// Lowered WHERE expression
#[derive(Debug, Clone, PartialEq)]
pub enum IRExpr {
    Column {
        name: String,
        ty: TypeExpr,
    },
    Literal(TypedValue),
    Unary {
        op: UnaryOp,
        operand: Box<IRExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<IRExpr>,
        right: Box<IRExpr>,
    },
    IsNull {
        operand: Box<IRExpr>,
        negated: bool,
    },
}

impl IRExpr {
    /// `(name, type)` of every referenced column
    pub fn columns(&self) -> Vec<(&str, &TypeExpr)> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<(&'a str, &'a TypeExpr)>) {
        match self {
            Self::Column { name, ty } => out.push((name, ty)),
            Self::Literal(_) => {}
            Self::Unary { operand, .. } | Self::IsNull { operand, .. } => operand.collect(out),
            Self::Binary { left, right, .. } => {
                left.collect(out);
                right.collect(out);
            }
        }
    }
}

impl fmt::Display for IRExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { name, .. } => f.write_str(name),
            Self::Literal(value) => write!(f, "{}", value.value()),
            Self::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "(NOT {})", operand),
            Self::Unary { op, operand } => write!(f, "({}{})", op.as_str(), operand),
            Self::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Self::IsNull { operand, negated } => write!(
                f,
                "({} IS {}NULL)",
                operand,
                if *negated { "NOT " } else { "" }
            ),
        }
    }
}

/// Column read by a SELECT, with its declared type
#[derive(Debug, Clone, PartialEq)]
pub struct IRColumn {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IROrder {
    pub column: String,
    pub direction: SortDirection,
}

/// Permission metadata carried by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionContext {
    /// Role the node was compiled for (bound by the pipeline)
    pub role_id: Option<String>,
    pub dialect: Dialect,
    /// Categories of every column the node writes or reads
    pub required_categories: BTreeSet<TypeCategory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IRNode {
    pub kind: StatementKind,
    pub table: String,
    pub rows: Vec<IRRow>,
    /// Columns read by SELECT, or removed by DELETE
    pub projection: Vec<IRColumn>,
    pub predicate: Option<IRExpr>,
    pub order_by: Vec<IROrder>,
    pub limit: Option<u64>,
    pub normal_form: Option<NormalForm>,
    pub provenance: Option<ProvenanceRecord>,
    pub permission: PermissionContext,
}

impl IRNode {
    pub fn bind_role(mut self, role_id: impl Into<String>) -> Self {
        self.permission.role_id = Some(role_id.into());
        self
    }

    pub fn row(&self, column: &str) -> Option<&IRRow> {
        self.rows.iter().find(|r| r.column == column)
    }

    /// Every row proof is verified
    pub fn is_fully_verified(&self) -> bool {
        self.rows.iter().all(|r| r.proof.verified)
    }
}
