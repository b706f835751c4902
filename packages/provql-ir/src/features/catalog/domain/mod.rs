//! Catalog domain: errors and the immutable snapshot

use crate::shared::models::{PermissionProfile, Schema};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },
}

impl CatalogError {
    pub fn schema_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "schema",
            name: name.into(),
        }
    }

    pub fn profile_not_found(role: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "permission profile",
            name: role.into(),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Unavailable(_) => "unavailable",
            Self::Load { .. } => "load",
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// One consistent version of every schema and profile
///
/// Never mutated after construction; updates build a new snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub version: u64,
    schemas: FxHashMap<String, Arc<Schema>>,
    profiles: FxHashMap<String, Arc<PermissionProfile>>,
}

impl CatalogSnapshot {
    pub fn new(
        schemas: impl IntoIterator<Item = Schema>,
        profiles: impl IntoIterator<Item = PermissionProfile>,
    ) -> Self {
        Self {
            version: 0,
            schemas: schemas
                .into_iter()
                .map(|s| (s.name().to_string(), Arc::new(s)))
                .collect(),
            profiles: profiles
                .into_iter()
                .map(|p| (p.role_id.clone(), Arc::new(p)))
                .collect(),
        }
    }

    pub fn schema(&self, name: &str) -> CatalogResult<Arc<Schema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::schema_not_found(name))
    }

    pub fn profile(&self, role: &str) -> CatalogResult<Arc<PermissionProfile>> {
        self.profiles
            .get(role)
            .cloned()
            .ok_or_else(|| CatalogError::profile_not_found(role))
    }

    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Copy with one schema added or replaced, version bumped
    pub(crate) fn with_schema(&self, schema: Schema) -> Self {
        let mut next = self.clone();
        next.schemas.insert(schema.name().to_string(), Arc::new(schema));
        next.version += 1;
        next
    }

    pub(crate) fn with_profile(&self, profile: PermissionProfile) -> Self {
        let mut next = self.clone();
        next.profiles.insert(profile.role_id.clone(), Arc::new(profile));
        next.version += 1;
        next
    }

    pub(crate) fn without_schema(&self, name: &str) -> Option<Self> {
        let mut next = self.clone();
        next.schemas.remove(name)?;
        next.version += 1;
        Some(next)
    }
}
