//! Catalog
//!
//! Schema registry and permission store ports, plus a copy-on-write
//! implementation. A compile reads one pinned snapshot end to end.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{CatalogError, CatalogResult, CatalogSnapshot};
pub use infrastructure::{load_profiles_yaml, SnapshotCatalog};
pub use ports::{PermissionStore, SchemaRegistry};
