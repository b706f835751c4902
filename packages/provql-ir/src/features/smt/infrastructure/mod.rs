pub mod interval_verifier;
pub mod runtime_verifier;

pub use interval_verifier::IntervalVerifier;
pub use runtime_verifier::{RuntimeOnlyVerifier, RuntimePredicateVerifier};
