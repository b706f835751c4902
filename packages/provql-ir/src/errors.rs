//! Error types for provql-ir
//!
//! Each layer has its own error (`PipelineError`, `ConfigError`, ...);
//! `ProvqlError` unifies them for callers that drive several layers, such as
//! the CLI.

use crate::config::ConfigError;
use crate::features::catalog::CatalogError;
use crate::features::execution::ExecutionError;
use crate::features::serialization::SerializationError;
use crate::pipeline::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvqlError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvqlError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Pipeline(e) => e.category(),
            Self::Config(_) => "config",
            Self::Serialization(e) => e.category(),
            Self::Execution(e) => e.category(),
            Self::Catalog(e) => e.category(),
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvqlError>;
