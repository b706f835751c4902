//! Constraint verification
//!
//! Decides whether literal values satisfy refinement types.
//!
//! ```text
//! smt
//! ├── domain/          Interval, Verification
//! ├── ports/           ConstraintVerifier
//! ├── infrastructure/  IntervalVerifier, RuntimePredicateVerifier, RuntimeOnlyVerifier
//! └── application/     verify_refinement (static stage + runtime fallback)
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{verify_refinement, VerificationFailure, VerifiedValue};
pub use domain::{Comparison, Interval, Verification, VerificationMethod};
pub use infrastructure::{IntervalVerifier, RuntimeOnlyVerifier, RuntimePredicateVerifier};
pub use ports::ConstraintVerifier;
