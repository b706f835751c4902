mod snapshot_catalog;

pub use snapshot_catalog::{load_profiles_yaml, SnapshotCatalog};
