use crate::features::parsing::StatementKind;
use crate::shared::models::{ProvenanceError, RefinementError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoweringError {
    #[error("{kind} requires provenance: missing {field}")]
    MissingProvenance {
        kind: StatementKind,
        field: &'static str,
    },

    #[error("invalid provenance: {0}")]
    Provenance(#[from] ProvenanceError),

    #[error("predicate literal rejected: {0}")]
    Refinement(#[from] RefinementError),
}

impl LoweringError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingProvenance { .. } | Self::Provenance(_) => "provenance",
            Self::Refinement(_) => "refinement",
        }
    }
}
