//! Execution engine port
//!
//! Called by the consumer of a successful compile. Compilation itself never
//! submits anything.

use super::domain::{ExecutionResult, RowResult};
use crate::features::ir_generation::IRNode;

pub trait ExecutionEngine: Send + Sync {
    fn submit(&self, node: &IRNode) -> ExecutionResult<RowResult>;
}
