//! IR generation
//!
//! Lowers type-checked statements into `IRNode`s with proof and provenance
//! metadata. Compilation ends here; nothing in this feature performs I/O.

pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::{
    fingerprint, mint_proof, resolve_provenance, IRBuilder, ProofCache, ProvenanceDefaults,
    DEFAULT_PROOF_CACHE_CAPACITY,
};
