//! Shared module - Common types and utilities
//!
//! Types shared across all features. No stage-specific logic lives here.

pub mod models;
pub mod utils;

// Re-exports for convenience
pub use models::*;
