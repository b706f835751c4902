//! IRNode <-> DataItem
//!
//! The node becomes a text-keyed map. Decoding rebuilds every value through
//! `decode_value` (re-verifying refinement and proof) and rebuilds provenance
//! through `ProvenanceRecord::new`, so a decoded node upholds the same
//! invariants as one produced by the IR builder.

use super::value_codec::{decode_value, encode_value, proof_for, required, text_field};
use crate::features::ir_generation::{
    IRColumn, IRExpr, IRNode, IROrder, IRRow, PermissionContext,
};
use crate::features::parsing::{BinaryOp, SortDirection, StatementKind, UnaryOp};
use crate::features::serialization::domain::{DataItem, SerializationError, SerializationResult};
use crate::features::type_checking::Dialect;
use crate::shared::models::{NormalForm, ProvenanceRecord, TypeCategory, TypeExpr};
use std::collections::BTreeSet;

const KINDS: [StatementKind; 5] = [
    StatementKind::Insert,
    StatementKind::Select,
    StatementKind::Update,
    StatementKind::Delete,
    StatementKind::Normalize,
];

const UNARY_OPS: [UnaryOp; 3] = [UnaryOp::Not, UnaryOp::Neg, UnaryOp::Plus];

const BINARY_OPS: [BinaryOp; 15] = [
    BinaryOp::Or,
    BinaryOp::And,
    BinaryOp::Eq,
    BinaryOp::NotEq,
    BinaryOp::Lt,
    BinaryOp::Gt,
    BinaryOp::LtEq,
    BinaryOp::GtEq,
    BinaryOp::Concat,
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Mod,
    BinaryOp::Pow,
];

pub fn encode_ir(node: &IRNode) -> DataItem {
    let rows = node
        .rows
        .iter()
        .map(|row| {
            DataItem::map([
                ("column", DataItem::text(&row.column)),
                ("value", encode_value(&row.value, &row.proof)),
                ("dialect", DataItem::text(row.dialect.as_str())),
            ])
        })
        .collect();
    let projection = node
        .projection
        .iter()
        .map(|c| {
            DataItem::map([
                ("name", DataItem::text(&c.name)),
                ("type", DataItem::text(c.ty.to_string())),
            ])
        })
        .collect();
    let order_by = node
        .order_by
        .iter()
        .map(|o| {
            DataItem::map([
                ("column", DataItem::text(&o.column)),
                ("direction", DataItem::text(o.direction.to_string())),
            ])
        })
        .collect();
    let provenance = node.provenance.as_ref().map(|p| {
        DataItem::map([
            ("actor_id", DataItem::text(p.actor_id())),
            ("timestamp", DataItem::Unsigned(p.timestamp())),
            ("rationale", DataItem::text(p.rationale())),
        ])
    });
    let permission = DataItem::map([
        (
            "role_id",
            DataItem::optional(node.permission.role_id.as_deref().map(DataItem::text)),
        ),
        ("dialect", DataItem::text(node.permission.dialect.as_str())),
        (
            "required_categories",
            DataItem::Array(
                node.permission
                    .required_categories
                    .iter()
                    .map(|c| DataItem::text(c.as_str()))
                    .collect(),
            ),
        ),
    ]);

    DataItem::map([
        ("kind", DataItem::text(node.kind.as_str())),
        ("table", DataItem::text(&node.table)),
        ("rows", DataItem::Array(rows)),
        ("projection", DataItem::Array(projection)),
        ("predicate", DataItem::optional(node.predicate.as_ref().map(encode_expr))),
        ("order_by", DataItem::Array(order_by)),
        ("limit", DataItem::optional(node.limit.map(DataItem::Unsigned))),
        (
            "normal_form",
            DataItem::optional(node.normal_form.map(|f| DataItem::text(f.to_string()))),
        ),
        ("provenance", DataItem::optional(provenance)),
        ("permission", permission),
    ])
}

pub fn decode_ir(item: &DataItem) -> SerializationResult<IRNode> {
    if !matches!(item, DataItem::Map(_)) {
        return Err(SerializationError::unexpected("IR map", item.describe()));
    }
    let kind = lookup("kind", text_field(item, "kind")?, &KINDS, StatementKind::as_str)?;
    let table = text_field(item, "table")?.to_string();

    let rows = array_field(item, "rows")?
        .iter()
        .map(decode_row)
        .collect::<SerializationResult<Vec<_>>>()?;
    let projection = array_field(item, "projection")?
        .iter()
        .map(|c| -> SerializationResult<IRColumn> {
            Ok(IRColumn {
                name: text_field(c, "name")?.to_string(),
                ty: parse_type(text_field(c, "type")?)?,
            })
        })
        .collect::<SerializationResult<Vec<_>>>()?;
    let predicate = match optional_field(item, "predicate") {
        Some(expr) => Some(decode_expr(expr)?),
        None => None,
    };
    let order_by = array_field(item, "order_by")?
        .iter()
        .map(|o| -> SerializationResult<IROrder> {
            Ok(IROrder {
                column: text_field(o, "column")?.to_string(),
                direction: parse_direction(text_field(o, "direction")?)?,
            })
        })
        .collect::<SerializationResult<Vec<_>>>()?;
    let limit = match optional_field(item, "limit") {
        Some(limit) => Some(
            limit
                .as_u64()
                .ok_or_else(|| SerializationError::field("limit", "expected unsigned integer"))?,
        ),
        None => None,
    };
    let normal_form = match optional_field(item, "normal_form") {
        Some(form) => Some(
            form.as_str()
                .ok_or_else(|| SerializationError::field("normal_form", "expected text"))?
                .parse::<NormalForm>()
                .map_err(|e| SerializationError::field("normal_form", e))?,
        ),
        None => None,
    };

    let provenance = match optional_field(item, "provenance") {
        Some(p) => {
            let timestamp = required(p, "timestamp")?
                .as_u64()
                .ok_or_else(|| SerializationError::field("timestamp", "expected unsigned integer"))?;
            let record = ProvenanceRecord::new(
                text_field(p, "actor_id")?,
                timestamp,
                text_field(p, "rationale")?,
            )
            .map_err(|e| SerializationError::field("provenance", e.to_string()))?;
            Some(record)
        }
        None => None,
    };
    match (kind.is_mutation(), &provenance) {
        (true, None) => {
            return Err(SerializationError::field(
                "provenance",
                format!("{} node requires provenance", kind),
            ))
        }
        (false, Some(_)) => {
            return Err(SerializationError::field(
                "provenance",
                format!("{} node carries no provenance", kind),
            ))
        }
        _ => {}
    }

    let permission = decode_permission(required(item, "permission")?)?;

    Ok(IRNode {
        kind,
        table,
        rows,
        projection,
        predicate,
        order_by,
        limit,
        normal_form,
        provenance,
        permission,
    })
}

fn decode_row(item: &DataItem) -> SerializationResult<IRRow> {
    let (value, proof) = decode_value(required(item, "value")?)?;
    Ok(IRRow {
        column: text_field(item, "column")?.to_string(),
        value,
        proof,
        dialect: parse_dialect(text_field(item, "dialect")?)?,
    })
}

fn decode_permission(item: &DataItem) -> SerializationResult<PermissionContext> {
    let role_id = match optional_field(item, "role_id") {
        Some(role) => Some(
            role.as_str()
                .ok_or_else(|| SerializationError::field("role_id", "expected text"))?
                .to_string(),
        ),
        None => None,
    };
    let required_categories = array_field(item, "required_categories")?
        .iter()
        .map(|c| {
            c.as_str()
                .ok_or_else(|| SerializationError::field("required_categories", "expected text"))?
                .parse::<TypeCategory>()
                .map_err(|e| SerializationError::field("required_categories", e))
        })
        .collect::<SerializationResult<BTreeSet<_>>>()?;
    Ok(PermissionContext {
        role_id,
        dialect: parse_dialect(text_field(item, "dialect")?)?,
        required_categories,
    })
}

fn encode_expr(expr: &IRExpr) -> DataItem {
    match expr {
        IRExpr::Column { name, ty } => DataItem::map([
            ("op", DataItem::text("column")),
            ("name", DataItem::text(name)),
            ("type", DataItem::text(ty.to_string())),
        ]),
        IRExpr::Literal(value) => DataItem::map([
            ("op", DataItem::text("literal")),
            ("value", encode_value(value, &proof_for(value))),
        ]),
        IRExpr::Unary { op, operand } => DataItem::map([
            ("op", DataItem::text(op.as_str())),
            ("operand", encode_expr(operand)),
        ]),
        IRExpr::Binary { op, left, right } => DataItem::map([
            ("op", DataItem::text(op.as_str())),
            ("left", encode_expr(left)),
            ("right", encode_expr(right)),
        ]),
        IRExpr::IsNull { operand, negated } => DataItem::map([
            ("op", DataItem::text("is_null")),
            ("operand", encode_expr(operand)),
            ("negated", DataItem::Bool(*negated)),
        ]),
    }
}

fn decode_expr(item: &DataItem) -> SerializationResult<IRExpr> {
    let op = text_field(item, "op")?;
    let operand = || -> SerializationResult<Box<IRExpr>> {
        Ok(Box::new(decode_expr(required(item, "operand")?)?))
    };
    Ok(match op {
        "column" => IRExpr::Column {
            name: text_field(item, "name")?.to_string(),
            ty: parse_type(text_field(item, "type")?)?,
        },
        "literal" => IRExpr::Literal(decode_value(required(item, "value")?)?.0),
        "is_null" => IRExpr::IsNull {
            operand: operand()?,
            negated: required(item, "negated")?
                .as_bool()
                .ok_or_else(|| SerializationError::field("negated", "expected boolean"))?,
        },
        other if item.field("right").is_some() => IRExpr::Binary {
            op: lookup("op", other, &BINARY_OPS, BinaryOp::as_str)?,
            left: Box::new(decode_expr(required(item, "left")?)?),
            right: Box::new(decode_expr(required(item, "right")?)?),
        },
        other => IRExpr::Unary {
            op: lookup("op", other, &UNARY_OPS, UnaryOp::as_str)?,
            operand: operand()?,
        },
    })
}

fn lookup<T: Copy>(
    field: &str,
    text: &str,
    candidates: &[T],
    name: impl Fn(&T) -> &'static str,
) -> SerializationResult<T> {
    candidates
        .iter()
        .find(|c| name(*c) == text)
        .copied()
        .ok_or_else(|| SerializationError::field(field, format!("unknown value '{}'", text)))
}

fn parse_type(text: &str) -> SerializationResult<TypeExpr> {
    text.parse()
        .map_err(|e: String| SerializationError::field("type", e))
}

fn parse_dialect(text: &str) -> SerializationResult<Dialect> {
    lookup(
        "dialect",
        text,
        &[Dialect::Explicit, Dialect::Inferred],
        Dialect::as_str,
    )
}

fn parse_direction(text: &str) -> SerializationResult<SortDirection> {
    match text {
        "ASC" => Ok(SortDirection::Asc),
        "DESC" => Ok(SortDirection::Desc),
        other => Err(SerializationError::field(
            "direction",
            format!("unknown value '{}'", other),
        )),
    }
}

fn array_field<'a>(item: &'a DataItem, name: &str) -> SerializationResult<&'a [DataItem]> {
    required(item, name)?
        .as_array()
        .ok_or_else(|| SerializationError::field(name, "expected array"))
}

/// Present and non-null
fn optional_field<'a>(item: &'a DataItem, name: &str) -> Option<&'a DataItem> {
    item.field(name).filter(|v| !v.is_null())
}
