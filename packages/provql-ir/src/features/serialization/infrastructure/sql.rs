//! Advisory SQL lowering
//!
//! One-way and lossy: refinement types, proof blobs, permission context and
//! provenance have no SQL counterpart. The text always starts with a warning
//! comment and every dropped piece of metadata is listed in `warnings`.

use crate::features::ir_generation::{IRExpr, IRNode};
use crate::features::parsing::{BinaryOp, StatementKind, UnaryOp};
use crate::shared::models::{format_float, timestamp_to_rfc3339, Value};
use tracing::warn;

pub const LOSSY_MARKER: &str = "-- WARNING: lossy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlLowering {
    pub text: String,
    pub warnings: Vec<String>,
}

pub fn lower_to_sql(node: &IRNode) -> SqlLowering {
    let mut warnings = Vec::new();
    let refined = node.rows.iter().filter(|r| r.value.ty().is_refined()).count();
    if refined > 0 {
        warnings.push(format!("{} refinement type(s) erased to base SQL types", refined));
    }
    if !node.rows.is_empty() {
        warnings.push(format!("{} proof blob(s) dropped", node.rows.len()));
    }
    if let Some(record) = &node.provenance {
        warnings.push(format!(
            "provenance of actor '{}' dropped",
            record.actor_id()
        ));
    }
    if node.permission.role_id.is_some() || !node.permission.required_categories.is_empty() {
        warnings.push("permission context dropped".to_string());
    }

    let statement = match node.kind {
        StatementKind::Insert => {
            let columns: Vec<&str> = node.rows.iter().map(|r| r.column.as_str()).collect();
            let values: Vec<String> = node.rows.iter().map(|r| literal(r.value.value())).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({});",
                node.table,
                columns.join(", "),
                values.join(", ")
            )
        }
        StatementKind::Select => {
            let columns = if node.projection.is_empty() {
                "*".to_string()
            } else {
                node.projection
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let mut text = format!("SELECT {} FROM {}", columns, node.table);
            push_where(&mut text, node.predicate.as_ref());
            if !node.order_by.is_empty() {
                let keys: Vec<String> = node
                    .order_by
                    .iter()
                    .map(|o| format!("{} {}", o.column, o.direction))
                    .collect();
                text.push_str(&format!(" ORDER BY {}", keys.join(", ")));
            }
            if let Some(limit) = node.limit {
                text.push_str(&format!(" LIMIT {}", limit));
            }
            text.push(';');
            text
        }
        StatementKind::Update => {
            let sets: Vec<String> = node
                .rows
                .iter()
                .map(|r| format!("{} = {}", r.column, literal(r.value.value())))
                .collect();
            let mut text = format!("UPDATE {} SET {}", node.table, sets.join(", "));
            push_where(&mut text, node.predicate.as_ref());
            text.push(';');
            text
        }
        StatementKind::Delete => {
            let mut text = format!("DELETE FROM {}", node.table);
            push_where(&mut text, node.predicate.as_ref());
            text.push(';');
            text
        }
        StatementKind::Normalize => {
            warnings.push("NORMALIZE has no SQL equivalent".to_string());
            match node.normal_form {
                Some(form) => format!("-- NORMALIZE {} TO {}", node.table, form),
                None => format!("-- NORMALIZE {}", node.table),
            }
        }
    };

    for warning in &warnings {
        warn!(table = %node.table, kind = %node.kind, "lossy SQL lowering: {}", warning);
    }

    SqlLowering {
        text: format!(
            "{} lowering; types, proofs and permissions are not represented\n{}",
            LOSSY_MARKER, statement
        ),
        warnings,
    }
}

fn push_where(text: &mut String, predicate: Option<&IRExpr>) {
    if let Some(predicate) = predicate {
        text.push_str(" WHERE ");
        text.push_str(&expr(predicate));
    }
}

fn expr(e: &IRExpr) -> String {
    match e {
        IRExpr::Column { name, .. } => name.clone(),
        IRExpr::Literal(value) => literal(value.value()),
        IRExpr::Unary {
            op: UnaryOp::Not,
            operand,
        } => format!("NOT ({})", expr(operand)),
        IRExpr::Unary { op, operand } => format!("{}({})", op.as_str(), expr(operand)),
        IRExpr::Binary {
            op: BinaryOp::Pow,
            left,
            right,
        } => format!("POWER({}, {})", expr(left), expr(right)),
        IRExpr::Binary { op, left, right } => {
            let symbol = match op {
                BinaryOp::NotEq => "<>",
                other => other.as_str(),
            };
            format!("({} {} {})", expr(left), symbol, expr(right))
        }
        IRExpr::IsNull { operand, negated } => format!(
            "{} IS {}NULL",
            expr(operand),
            if *negated { "NOT " } else { "" }
        ),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Nat(n) => n.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format_float(*x),
        Value::Text(s) => quote(s),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Uuid(u) => quote(&u.hyphenated().to_string()),
        Value::Timestamp(ms) => match timestamp_to_rfc3339(*ms) {
            Some(text) => quote(&text),
            None => ms.to_string(),
        },
        Value::Vector(items) => format!(
            "ARRAY[{}]",
            items.iter().map(literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Scores(scores) => quote(&scores.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::IRBuilder;
    use crate::features::parsing::parse_str;
    use crate::features::smt::IntervalVerifier;
    use crate::features::type_checking::check;
    use crate::shared::models::{ColumnDef, ProvenanceRecord, Schema, TypeExpr};

    fn lower(source: &str) -> SqlLowering {
        let schema = Schema::new(
            "evidence",
            vec![
                ColumnDef::new("title", TypeExpr::NonEmptyString),
                ColumnDef::new("score", TypeExpr::Nat),
                ColumnDef::new("prompt_provenance", TypeExpr::bounded_nat(0, 100)),
            ],
        )
        .unwrap();
        let typed = check(&parse_str(source).unwrap(), &schema, &IntervalVerifier).unwrap();
        let record = ProvenanceRecord::new("alice", 1, "because").unwrap();
        let node = IRBuilder::default().lower(&typed, Some(record)).unwrap();
        lower_to_sql(&node)
    }

    #[test]
    fn test_insert_is_flagged_lossy() {
        let sql = lower("INSERT INTO evidence SET title = \"O'Neil\", score = 3");
        assert!(sql.text.starts_with(LOSSY_MARKER));
        assert!(sql
            .text
            .ends_with("INSERT INTO evidence (title, score) VALUES ('O''Neil', 3);"));
        assert!(sql.warnings.iter().any(|w| w.contains("proof blob")));
        assert!(sql.warnings.iter().any(|w| w.contains("actor 'alice'")));
    }

    #[test]
    fn test_update_and_delete() {
        let sql = lower("UPDATE evidence SET score = 1 WHERE title != \"x\" RATIONALE \"fix\"");
        assert!(sql
            .text
            .ends_with("UPDATE evidence SET score = 1 WHERE (title <> 'x');"));

        let sql = lower("DELETE FROM evidence WHERE score > 2 AND NOT score = 5 RATIONALE \"gc\"");
        assert!(sql
            .text
            .ends_with("DELETE FROM evidence WHERE ((score > 2) AND NOT ((score = 5)));"));
    }

    #[test]
    fn test_select() {
        let sql = lower("SELECT title, score FROM evidence WHERE score >= 10 ORDER BY score DESC LIMIT 5");
        assert!(sql.text.ends_with(
            "SELECT title, score FROM evidence WHERE (score >= 10) ORDER BY score DESC LIMIT 5;"
        ));
        assert!(sql.warnings.iter().all(|w| !w.contains("proof")));
    }

    #[test]
    fn test_normalize_is_a_comment() {
        let sql = lower("NORMALIZE evidence TO BCNF RATIONALE \"split\"");
        assert!(sql.text.ends_with("-- NORMALIZE evidence TO BCNF"));
        assert!(sql.warnings.iter().any(|w| w.contains("no SQL equivalent")));
    }
}
