//! Catalog ports
//!
//! Both are read-only from the compiler's side. Schema lookup is async since
//! real registries sit behind I/O.

use super::domain::{CatalogResult, CatalogSnapshot};
use crate::shared::models::{PermissionProfile, Schema};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    async fn lookup(&self, collection: &str) -> CatalogResult<Arc<Schema>>;
}

pub trait PermissionStore: Send + Sync {
    fn profile_for(&self, role_id: &str) -> CatalogResult<Arc<PermissionProfile>>;
}

#[async_trait]
impl SchemaRegistry for CatalogSnapshot {
    async fn lookup(&self, collection: &str) -> CatalogResult<Arc<Schema>> {
        self.schema(collection)
    }
}

impl PermissionStore for CatalogSnapshot {
    fn profile_for(&self, role_id: &str) -> CatalogResult<Arc<PermissionProfile>> {
        self.profile(role_id)
    }
}
