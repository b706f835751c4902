//! Constraint verification domain models

pub mod interval;
pub mod verification;

pub use interval::{Comparison, Interval};
pub use verification::{Verification, VerificationMethod};
