//! Copy-on-write catalog
//!
//! Readers `pin()` an `Arc<CatalogSnapshot>` and keep it for a whole compile.
//! Writers build a modified copy and swap the pointer; the lock is held only
//! for the pointer clone or swap, never across an await.

use crate::features::catalog::domain::{CatalogError, CatalogResult, CatalogSnapshot};
use crate::features::catalog::ports::{PermissionStore, SchemaRegistry};
use crate::shared::models::{PermissionProfile, Schema};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct SnapshotCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
    /// Serializes writers so concurrent updates are not lost
    writer: Mutex<()>,
}

impl SnapshotCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
        }
    }

    pub fn pin(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    pub fn replace_schema(&self, schema: Schema) -> u64 {
        let name = schema.name().to_string();
        self.update(|snapshot| Some(snapshot.with_schema(schema)), "schema", &name)
            .unwrap_or_else(|| self.version())
    }

    pub fn replace_profile(&self, profile: PermissionProfile) -> u64 {
        let role = profile.role_id.clone();
        self.update(|snapshot| Some(snapshot.with_profile(profile)), "profile", &role)
            .unwrap_or_else(|| self.version())
    }

    pub fn remove_schema(&self, name: &str) -> CatalogResult<u64> {
        self.update(|snapshot| snapshot.without_schema(name), "schema removal", name)
            .ok_or_else(|| CatalogError::schema_not_found(name))
    }

    pub fn load_schema_yaml(&self, path: impl AsRef<Path>) -> CatalogResult<u64> {
        let path = path.as_ref();
        let schema = Schema::from_yaml(path).map_err(|e| CatalogError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.replace_schema(schema))
    }

    fn update(
        &self,
        change: impl FnOnce(&CatalogSnapshot) -> Option<CatalogSnapshot>,
        what: &str,
        name: &str,
    ) -> Option<u64> {
        let _writer = self.writer.lock();
        let next = change(&self.pin())?;
        let version = next.version;
        *self.current.write() = Arc::new(next);
        info!(version, name, "catalog {} swapped in", what);
        Some(version)
    }
}

#[async_trait]
impl SchemaRegistry for SnapshotCatalog {
    async fn lookup(&self, collection: &str) -> CatalogResult<Arc<Schema>> {
        self.pin().schema(collection)
    }
}

impl PermissionStore for SnapshotCatalog {
    fn profile_for(&self, role_id: &str) -> CatalogResult<Arc<PermissionProfile>> {
        self.pin().profile(role_id)
    }
}

/// Permission profiles from a YAML list
///
/// ```yaml
/// - role_id: analyst
///   type_whitelist: [String, NonEmptyString, BoundedNat]
///   validation_level: strict
/// ```
pub fn load_profiles_yaml(path: impl AsRef<Path>) -> CatalogResult<Vec<PermissionProfile>> {
    let path = path.as_ref();
    let load_error = |reason: String| CatalogError::Load {
        path: path.display().to_string(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    serde_yaml::from_str(&text).map_err(|e| load_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ColumnDef, TypeCategory, TypeExpr};
    use std::io::Write;

    fn schema(name: &str, column: &str) -> Schema {
        Schema::new(name, vec![ColumnDef::new(column, TypeExpr::Nat)]).unwrap()
    }

    #[test]
    fn test_pinned_snapshot_is_stable_across_swaps() {
        let catalog = SnapshotCatalog::new(CatalogSnapshot::new(
            [schema("evidence", "score")],
            [PermissionProfile::unrestricted("admin")],
        ));
        let pinned = catalog.pin();

        assert_eq!(catalog.replace_schema(schema("evidence", "rank")), 1);
        assert!(pinned.schema("evidence").unwrap().column("score").is_some());
        assert!(catalog.pin().schema("evidence").unwrap().column("rank").is_some());
        assert_eq!(pinned.version, 0);
        assert_eq!(catalog.version(), 1);
    }

    #[test]
    fn test_lookup_errors() {
        let catalog = SnapshotCatalog::default();
        assert_eq!(
            catalog.profile_for("ghost").unwrap_err(),
            CatalogError::profile_not_found("ghost")
        );
        assert_eq!(catalog.remove_schema("ghost"), Err(CatalogError::schema_not_found("ghost")));
    }

    #[tokio::test]
    async fn test_async_lookup() {
        let catalog = SnapshotCatalog::default();
        catalog.replace_schema(schema("evidence", "score"));
        let found = catalog.lookup("evidence").await.unwrap();
        assert_eq!(found.name(), "evidence");
        assert!(matches!(
            catalog.lookup("missing").await,
            Err(CatalogError::NotFound { kind: "schema", .. })
        ));
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let catalog = Arc::new(SnapshotCatalog::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || {
                    catalog.replace_profile(PermissionProfile::new(
                        format!("role{}", i),
                        [TypeCategory::Nat],
                    ));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(catalog.version(), 8);
        for i in 0..8 {
            assert!(catalog.profile_for(&format!("role{}", i)).is_ok());
        }
    }

    #[test]
    fn test_load_profiles_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- role_id: analyst\n  type_whitelist: [String, BoundedNat]\n  validation_level: strict"
        )
        .unwrap();
        let profiles = load_profiles_yaml(file.path()).unwrap();
        assert_eq!(profiles.len(), 1);
        assert!(profiles[0].allows(TypeCategory::BoundedNat));
        assert!(!profiles[0].allows(TypeCategory::Nat));
    }
}
