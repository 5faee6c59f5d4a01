//! Identity-management artifact handlers
//!
//! The global sync aggregate (`sync.json`) is re-applied once by the
//! orchestrator after replay, so these handlers leave it alone.

use super::{entity_id, entity_name, ArtifactHandler, DispatchContext, DispatchOutcome};
use crate::backend::{ConfigBackend, ImportOptions};
use crate::error::DispatchError;
use envpromo_artifact::{ArtifactPath, Scope};
use std::sync::Arc;

const SYNC_REAPPLIED: &str = "global sync aggregate is re-applied after replay";

fn is_global_sync(path: &ArtifactPath) -> bool {
    path.is_sync_aggregate() && path.scope() == Scope::Global
}

/// Configuration-store entities
pub struct IdmHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl IdmHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for IdmHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        if is_global_sync(path) {
            return Ok(DispatchOutcome::skipped(SYNC_REAPPLIED));
        }
        let file = ctx.master_file(path);
        let ok = if path.is_email_template() {
            let id = entity_id(&file)?;
            self.backend.import_email_template(&id, &file).await?
        } else {
            self.backend.import_config_entity(&file).await?
        };
        Ok(DispatchOutcome::Completed(ok))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let id = entity_id(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_config_entity(&id).await?))
    }
}

/// Email templates; removal goes through the configuration store
pub struct EmailTemplateHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl EmailTemplateHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for EmailTemplateHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let file = ctx.master_file(path);
        let id = entity_id(&file)?;
        Ok(DispatchOutcome::Completed(self.backend.import_email_template(&id, &file).await?))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let id = entity_id(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_config_entity(&id).await?))
    }
}

/// Themes live inside the idm UI config
#[derive(Debug, Default)]
pub struct ThemeHandler;

#[async_trait::async_trait]
impl ArtifactHandler for ThemeHandler {
    async fn apply(&self, _path: &ArtifactPath, _ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(DispatchOutcome::delegated("promoted with idm config"))
    }

    async fn remove(&self, _path: &ArtifactPath, _ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(DispatchOutcome::delegated("removed with idm config"))
    }
}

/// Managed applications, deleted by name
pub struct ManagedApplicationHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl ManagedApplicationHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for ManagedApplicationHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let ok = self
            .backend
            .import_managed_applications(&ctx.master_file(path), ImportOptions::with_dependencies())
            .await?;
        Ok(DispatchOutcome::Completed(ok))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let name = entity_name(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_managed_application(&name).await?))
    }
}

/// Sync mappings (`sync` and `mapping` paths)
pub struct MappingHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl MappingHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for MappingHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        if is_global_sync(path) {
            return Ok(DispatchOutcome::skipped(SYNC_REAPPLIED));
        }
        let file = ctx.master_file(path);
        let id = entity_id(&file)?;
        Ok(DispatchOutcome::Completed(self.backend.import_mapping(Some(&id), &file).await?))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let id = entity_id(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_mapping(&id).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Trees;
    use crate::plan::{PlanBackend, PlannedCall};
    use envpromo_test_utils::fixtures;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn idm_skips_global_sync_aggregate() {
        let trees = Trees::new();
        let backend = Arc::new(PlanBackend::new());
        let handler = IdmHandler::new(backend.clone());

        let outcome = handler
            .apply(&ArtifactPath::new("global/idm/sync.json"), &trees.ctx())
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Skipped(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn idm_imports_config_entity() {
        let trees = Trees::new();
        let rel = "global/idm/managed.json";
        trees.master.write_json(rel, &fixtures::idm_entity("managed"));
        let backend = Arc::new(PlanBackend::new());
        let handler = IdmHandler::new(backend.clone());

        handler.apply(&ArtifactPath::new(rel), &trees.ctx()).await.unwrap();

        assert_eq!(backend.calls(), vec![PlannedCall::ImportConfigEntity { file: trees.master.path(rel) }]);
    }

    #[tokio::test]
    async fn idm_routes_email_templates() {
        let trees = Trees::new();
        let rel = "global/idm/emailTemplate-welcome.json";
        trees.master.write_json(rel, &fixtures::idm_entity("emailTemplate/welcome"));
        let backend = Arc::new(PlanBackend::new());
        let handler = IdmHandler::new(backend.clone());

        handler.apply(&ArtifactPath::new(rel), &trees.ctx()).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![PlannedCall::ImportEmailTemplate {
                id: "emailTemplate/welcome".into(),
                file: trees.master.path(rel),
            }]
        );
    }

    #[tokio::test]
    async fn idm_delete_uses_root_id() {
        let trees = Trees::new();
        let rel = "global/idm/access.json";
        trees.export.write_json(rel, &fixtures::idm_entity("access"));
        let backend = Arc::new(PlanBackend::new());
        let handler = IdmHandler::new(backend.clone());

        handler.remove(&ArtifactPath::new(rel), &trees.ctx()).await.unwrap();

        assert_eq!(backend.calls(), vec![PlannedCall::DeleteConfigEntity { id: "access".into() }]);
    }

    #[tokio::test]
    async fn theme_is_delegated() {
        let trees = Trees::new();
        let path = ArtifactPath::new("realm/alpha/theme/Starter.json");

        assert!(matches!(
            ThemeHandler.apply(&path, &trees.ctx()).await.unwrap(),
            DispatchOutcome::Delegated(_)
        ));
        assert!(matches!(
            ThemeHandler.remove(&path, &trees.ctx()).await.unwrap(),
            DispatchOutcome::Delegated(_)
        ));
    }

    #[tokio::test]
    async fn managed_application_deleted_by_name() {
        let trees = Trees::new();
        let rel = "realm/alpha/managedApplication/portal.json";
        trees.export.write_json(
            rel,
            &json!({"managedApplication": {"a1b2": {"_id": "a1b2", "name": "portal"}}}),
        );
        let backend = Arc::new(PlanBackend::new());
        let handler = ManagedApplicationHandler::new(backend.clone());

        handler.remove(&ArtifactPath::new(rel), &trees.ctx()).await.unwrap();

        assert_eq!(backend.calls(), vec![PlannedCall::DeleteManagedApplication { name: "portal".into() }]);
    }

    #[tokio::test]
    async fn mapping_imported_by_id() {
        let trees = Trees::new();
        let rel = "global/mapping/systemLdapAccounts_managedUser.json";
        trees.master.write_json(rel, &json!({"_id": "sync/systemLdapAccounts_managedUser", "source": "system/ldap"}));
        let backend = Arc::new(PlanBackend::new());
        let handler = MappingHandler::new(backend.clone());

        handler.apply(&ArtifactPath::new(rel), &trees.ctx()).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![PlannedCall::ImportMapping {
                id: Some("sync/systemLdapAccounts_managedUser".into()),
                file: trees.master.path(rel),
            }]
        );
    }
}
