//! Execution results and errors

use crate::shared::models::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Column name -> value
pub type Row = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowResult {
    /// Rows inserted, updated or deleted
    pub affected: u64,
    /// Rows returned by a SELECT
    pub rows: Vec<Row>,
}

impl RowResult {
    pub fn affected(affected: u64) -> Self {
        Self {
            affected,
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("node rejected: {0}")]
    Rejected(String),

    #[error("cannot evaluate predicate: {0}")]
    Evaluation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ExecutionError {
    pub fn evaluation(reason: impl Into<String>) -> Self {
        Self::Evaluation(reason.into())
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Evaluation(_) => "evaluation",
            Self::Storage(_) => "storage",
        }
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
