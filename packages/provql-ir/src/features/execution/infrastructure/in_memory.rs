//! In-memory execution engine
//!
//! Tables are created on first insert. Every mutation's provenance record is
//! appended to an audit log.

use super::evaluator::{compare_values, evaluate};
use crate::features::execution::domain::{ExecutionError, ExecutionResult, Row, RowResult};
use crate::features::execution::ports::ExecutionEngine;
use crate::features::ir_generation::{IRExpr, IRNode};
use crate::features::parsing::{SortDirection, StatementKind};
use crate::shared::models::{ProvenanceRecord, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryEngine {
    tables: RwLock<FxHashMap<String, Vec<Row>>>,
    audit: RwLock<Vec<(StatementKind, String, ProvenanceRecord)>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// `(kind, table, provenance)` of every applied mutation, oldest first
    pub fn audit_log(&self) -> Vec<(StatementKind, String, ProvenanceRecord)> {
        self.audit.read().clone()
    }

    fn matches(predicate: Option<&IRExpr>, row: &Row) -> ExecutionResult<bool> {
        match predicate {
            None => Ok(true),
            Some(expr) => Ok(matches!(evaluate(expr, row)?, Some(Value::Bool(true)))),
        }
    }

    fn select(&self, node: &IRNode) -> ExecutionResult<RowResult> {
        let tables = self.tables.read();
        let mut rows = Vec::new();
        for row in tables.get(&node.table).into_iter().flatten() {
            if Self::matches(node.predicate.as_ref(), row)? {
                rows.push(row.clone());
            }
        }
        drop(tables);

        if !node.order_by.is_empty() {
            rows.sort_by(|a, b| {
                for key in &node.order_by {
                    let ordering = match (a.get(&key.column), b.get(&key.column)) {
                        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                        (None, Some(_)) => Ordering::Less,
                        (Some(_), None) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    };
                    let ordering = match key.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(limit) = node.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        let rows = rows
            .into_iter()
            .map(|row| {
                node.projection
                    .iter()
                    .filter_map(|c| row.get(&c.name).map(|v| (c.name.clone(), v.clone())))
                    .collect()
            })
            .collect();
        Ok(RowResult { affected: 0, rows })
    }

    fn mutate(&self, node: &IRNode) -> ExecutionResult<RowResult> {
        let mut tables = self.tables.write();
        let affected = match node.kind {
            StatementKind::Insert => {
                let row: Row = node
                    .rows
                    .iter()
                    .map(|r| (r.column.clone(), r.value.value().clone()))
                    .collect();
                tables.entry(node.table.clone()).or_default().push(row);
                1
            }
            StatementKind::Update => {
                let mut affected = 0;
                for row in tables.get_mut(&node.table).into_iter().flatten() {
                    if Self::matches(node.predicate.as_ref(), row)? {
                        for assignment in &node.rows {
                            row.insert(assignment.column.clone(), assignment.value.value().clone());
                        }
                        affected += 1;
                    }
                }
                affected
            }
            StatementKind::Delete => {
                let Some(rows) = tables.get_mut(&node.table) else {
                    return Ok(RowResult::affected(0));
                };
                let before = rows.len();
                let mut kept = Vec::with_capacity(before);
                for row in rows.iter() {
                    if !Self::matches(node.predicate.as_ref(), row)? {
                        kept.push(row.clone());
                    }
                }
                let affected = (before - kept.len()) as u64;
                *rows = kept;
                affected
            }
            StatementKind::Normalize | StatementKind::Select => 0,
        };
        Ok(RowResult::affected(affected))
    }
}

impl ExecutionEngine for InMemoryEngine {
    fn submit(&self, node: &IRNode) -> ExecutionResult<RowResult> {
        if !node.is_fully_verified() {
            return Err(ExecutionError::Rejected(
                "node contains unverified values".to_string(),
            ));
        }
        if node.kind == StatementKind::Select {
            return self.select(node);
        }
        let record = node.provenance.clone().ok_or_else(|| {
            ExecutionError::Rejected(format!("{} without provenance", node.kind))
        })?;
        let result = self.mutate(node)?;
        self.audit
            .write()
            .push((node.kind, node.table.clone(), record));
        debug!(table = %node.table, kind = %node.kind, affected = result.affected, "applied");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::IRBuilder;
    use crate::features::parsing::parse_str;
    use crate::features::smt::IntervalVerifier;
    use crate::features::type_checking::check;
    use crate::shared::models::{ColumnDef, Schema, TypeExpr};

    fn node(source: &str) -> IRNode {
        let schema = Schema::new(
            "evidence",
            vec![
                ColumnDef::new("title", TypeExpr::NonEmptyString),
                ColumnDef::new("score", TypeExpr::Nat),
            ],
        )
        .unwrap();
        let typed = check(&parse_str(source).unwrap(), &schema, &IntervalVerifier).unwrap();
        let record = typed
            .kind
            .is_mutation()
            .then(|| ProvenanceRecord::new("alice", 1, "test").unwrap());
        IRBuilder::default().lower(&typed, record).unwrap()
    }

    #[test]
    fn test_insert_select_update_delete() {
        let engine = InMemoryEngine::new();
        for (title, score) in [("a", 3), ("b", 1), ("c", 2)] {
            let source = format!("INSERT INTO evidence SET title = \"{}\", score = {}", title, score);
            assert_eq!(engine.submit(&node(&source)).unwrap().affected, 1);
        }

        let result = engine
            .submit(&node("SELECT title FROM evidence WHERE score >= 2 ORDER BY score DESC"))
            .unwrap();
        let titles: Vec<&Value> = result.rows.iter().filter_map(|r| r.get("title")).collect();
        assert_eq!(titles, vec![&Value::Text("a".into()), &Value::Text("c".into())]);

        let updated = engine
            .submit(&node("UPDATE evidence SET score = 9 WHERE title = \"b\" RATIONALE \"fix\""))
            .unwrap();
        assert_eq!(updated.affected, 1);

        let deleted = engine
            .submit(&node("DELETE FROM evidence WHERE score < 5 RATIONALE \"gc\""))
            .unwrap();
        assert_eq!(deleted.affected, 2);
        assert_eq!(engine.rows("evidence").len(), 1);
        assert_eq!(engine.audit_log().len(), 5);
    }

    #[test]
    fn test_limit_and_missing_table() {
        let engine = InMemoryEngine::new();
        let empty = engine.submit(&node("SELECT * FROM evidence LIMIT 1")).unwrap();
        assert!(empty.rows.is_empty());
        for i in 0..3 {
            engine
                .submit(&node(&format!("INSERT INTO evidence SET title = \"t{}\", score = {}", i, i)))
                .unwrap();
        }
        let limited = engine.submit(&node("SELECT * FROM evidence LIMIT 2")).unwrap();
        assert_eq!(limited.rows.len(), 2);
    }

    #[test]
    fn test_mutation_without_provenance_is_rejected() {
        let engine = InMemoryEngine::new();
        let mut insert = node("INSERT INTO evidence SET score = 1");
        insert.provenance = None;
        assert!(matches!(engine.submit(&insert), Err(ExecutionError::Rejected(_))));
        assert!(engine.rows("evidence").is_empty());
    }
}
