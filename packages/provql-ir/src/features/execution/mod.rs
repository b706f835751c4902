//! Execution
//!
//! The storage/execution engine is an external collaborator. This feature
//! defines its port and ships an in-memory implementation for tests and the
//! CLI.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{ExecutionError, ExecutionResult, Row, RowResult};
pub use infrastructure::{compare_values, evaluate, InMemoryEngine};
pub use ports::ExecutionEngine;
