pub mod ir_builder;
pub mod proof_cache;
pub mod provenance;

pub use ir_builder::{fingerprint, mint_proof, IRBuilder, DEFAULT_PROOF_CACHE_CAPACITY};
pub use proof_cache::ProofCache;
pub use provenance::{resolve_provenance, ProvenanceDefaults};
