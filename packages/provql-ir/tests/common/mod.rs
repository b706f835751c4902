//! Common test utilities for provql-ir
//!
//! Shared fixtures, assertions, and builders for the integration tests.

#![allow(dead_code)]

mod fixtures;
mod assertions;
mod builders;

// Re-export all utilities
pub use fixtures::*;
pub use assertions::*;
pub use builders::*;
