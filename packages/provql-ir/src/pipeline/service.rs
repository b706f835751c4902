//! Async compile service
//!
//! Wraps the synchronous pipeline with the two collaborator lookups. Each
//! request pins one catalog snapshot, so a concurrent schema or profile swap
//! is either fully visible to it or not at all. Only the schema lookup
//! suspends; it is bounded by `catalog.lookup_timeout_ms` and races the
//! cancellation token. The remaining stages run inline.

use super::error::{PipelineError, PipelineResult};
use super::orchestrator::{CompileOutput, CompilePipeline, CompileRequest, Run};
use crate::features::catalog::{PermissionStore, SchemaRegistry, SnapshotCatalog};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

enum CatalogHandle {
    /// Pinned per request
    Snapshots(Arc<SnapshotCatalog>),
    /// Caller-provided ports, used as they are
    Ports {
        registry: Arc<dyn SchemaRegistry>,
        permissions: Arc<dyn PermissionStore>,
    },
}

struct Pinned {
    registry: Arc<dyn SchemaRegistry>,
    permissions: Arc<dyn PermissionStore>,
    version: Option<u64>,
}

impl CatalogHandle {
    fn pin(&self) -> Pinned {
        match self {
            Self::Snapshots(catalog) => {
                let snapshot = catalog.pin();
                let version = snapshot.version;
                Pinned {
                    registry: snapshot.clone(),
                    permissions: snapshot,
                    version: Some(version),
                }
            }
            Self::Ports {
                registry,
                permissions,
            } => Pinned {
                registry: registry.clone(),
                permissions: permissions.clone(),
                version: None,
            },
        }
    }
}

pub struct CompileService {
    pipeline: Arc<CompilePipeline>,
    catalog: CatalogHandle,
}

impl CompileService {
    pub fn new(
        pipeline: Arc<CompilePipeline>,
        registry: Arc<dyn SchemaRegistry>,
        permissions: Arc<dyn PermissionStore>,
    ) -> Self {
        Self {
            pipeline,
            catalog: CatalogHandle::Ports {
                registry,
                permissions,
            },
        }
    }

    /// Serve from a copy-on-write catalog, one snapshot per request
    pub fn from_catalog(pipeline: Arc<CompilePipeline>, catalog: Arc<SnapshotCatalog>) -> Self {
        Self {
            pipeline,
            catalog: CatalogHandle::Snapshots(catalog),
        }
    }

    pub fn pipeline(&self) -> &Arc<CompilePipeline> {
        &self.pipeline
    }

    pub async fn compile(&self, request: &CompileRequest) -> PipelineResult<CompileOutput> {
        self.compile_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Compile, giving up at the next stage boundary once `cancel` fires
    ///
    /// A cancelled request returns only the error; no IR or encoding escapes.
    pub async fn compile_with_cancel(
        &self,
        request: &CompileRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult<CompileOutput> {
        let pinned = self.catalog.pin();
        let mut run = Run::new(Some(cancel));
        let statement = self.pipeline.front(request, &mut run)?;
        let next = run.state();

        let table = statement.table().name.clone();
        let timeout = self.pipeline.config().catalog().lookup_timeout();
        debug!(table = %table, version = ?pinned.version, "looking up schema");
        let schema = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(run.fail(PipelineError::cancelled(next)));
            }
            result = tokio::time::timeout(timeout, pinned.registry.lookup(&table)) => match result {
                Ok(Ok(schema)) => schema,
                Ok(Err(error)) => return Err(run.fail(PipelineError::catalog(next, error))),
                Err(_) => {
                    warn!(table = %table, timeout_ms = timeout.as_millis() as u64, "schema lookup timed out");
                    return Err(run.fail(PipelineError::timeout(
                        next,
                        format!("schema lookup for '{}'", table),
                        timeout,
                    )));
                }
            }
        };

        let profile = match pinned.permissions.profile_for(&request.role_id) {
            Ok(profile) => profile,
            Err(error) => return Err(run.fail(PipelineError::catalog(next, error))),
        };

        self.pipeline
            .back(request, statement, &schema, &profile, run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompilerConfig, Preset};
    use crate::features::catalog::{CatalogResult, CatalogSnapshot};
    use crate::pipeline::{PipelineErrorKind, PipelineState};
    use crate::shared::models::{ColumnDef, PermissionProfile, Schema, TypeExpr};
    use async_trait::async_trait;
    use std::time::Duration;

    fn schema(columns: &[&str]) -> Schema {
        Schema::new(
            "evidence",
            columns
                .iter()
                .map(|c| ColumnDef::new(*c, TypeExpr::Nat))
                .collect(),
        )
        .unwrap()
    }

    fn catalog() -> Arc<SnapshotCatalog> {
        Arc::new(SnapshotCatalog::new(CatalogSnapshot::new(
            [schema(&["id"])],
            [PermissionProfile::unrestricted("analyst")],
        )))
    }

    struct SlowRegistry {
        delay: Duration,
    }

    #[async_trait]
    impl SchemaRegistry for SlowRegistry {
        async fn lookup(&self, _collection: &str) -> CatalogResult<Arc<Schema>> {
            tokio::time::sleep(self.delay).await;
            Ok(Arc::new(schema(&["id"])))
        }
    }

    fn slow_service(delay_ms: u64, timeout_ms: u64) -> CompileService {
        let config = CompilerConfig::preset(Preset::Balanced)
            .catalog(|c| c.lookup_timeout_ms(timeout_ms))
            .build()
            .unwrap();
        let snapshot = Arc::new(CatalogSnapshot::new(
            [],
            [PermissionProfile::unrestricted("analyst")],
        ));
        CompileService::new(
            Arc::new(CompilePipeline::new(config)),
            Arc::new(SlowRegistry {
                delay: Duration::from_millis(delay_ms),
            }),
            snapshot,
        )
    }

    #[tokio::test]
    async fn test_compile_from_catalog() {
        let service = CompileService::from_catalog(Arc::new(CompilePipeline::default()), catalog());
        let output = service
            .compile(&CompileRequest::new("SELECT id FROM evidence", "analyst"))
            .await
            .unwrap();
        assert_eq!(output.trace.last(), Some(&PipelineState::Done));
    }

    #[tokio::test]
    async fn test_schema_swap_visible_to_next_request() {
        let catalog = catalog();
        let service =
            CompileService::from_catalog(Arc::new(CompilePipeline::default()), catalog.clone());
        let request = CompileRequest::new("SELECT score FROM evidence", "analyst");

        let err = service.compile(&request).await.unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Type);

        catalog.replace_schema(schema(&["id", "score"]));
        assert!(service.compile(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_table_and_role() {
        let service = CompileService::from_catalog(Arc::new(CompilePipeline::default()), catalog());

        let err = service
            .compile(&CompileRequest::new("SELECT * FROM missing", "analyst"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Catalog);

        let err = service
            .compile(&CompileRequest::new("SELECT * FROM evidence", "intruder"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Catalog);
        assert!(err.message.contains("intruder"));
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let service = slow_service(500, 20);
        let err = service
            .compile(&CompileRequest::new("SELECT id FROM evidence", "analyst"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Timeout);
        assert_eq!(err.stage, PipelineState::TypeChecking);
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_cancel_during_lookup() {
        let service = slow_service(2_000, 10_000);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let err = service
            .compile_with_cancel(&CompileRequest::new("SELECT id FROM evidence", "analyst"), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let service = Arc::new(CompileService::from_catalog(
            Arc::new(CompilePipeline::default()),
            catalog(),
        ));
        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let source = format!("SELECT id FROM evidence WHERE id = {}", i);
                service
                    .compile(&CompileRequest::new(source, "analyst"))
                    .await
                    .is_ok()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
