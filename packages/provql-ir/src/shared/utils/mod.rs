//! Utility modules shared across features
//!
//! - `suggest`: "did you mean" suggestions for misspelt names

pub mod suggest;

pub use suggest::{closest_match, levenshtein_distance};
