//! Access-management artifact handlers

use super::{entity_id, entity_name, read_document, ArtifactHandler, DispatchContext, DispatchOutcome};
use crate::backend::{AgentKind, ConfigBackend, ImportOptions};
use crate::confirm::PruneConfirm;
use crate::error::DispatchError;
use envpromo_artifact::{ArtifactPath, Scope};
use std::sync::Arc;

/// OAuth2 clients (`application`)
pub struct OAuth2ClientHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl OAuth2ClientHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for OAuth2ClientHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let file = ctx.master_file(path);
        let id = entity_id(&file)?;
        let ok = self
            .backend
            .import_oauth2_client(&id, &file, ImportOptions::with_dependencies())
            .await?;
        Ok(DispatchOutcome::Completed(ok))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let id = entity_id(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_oauth2_client(&id).await?))
    }
}

/// Realm authentication settings
pub struct AuthenticationHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl AuthenticationHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for AuthenticationHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let ok = self.backend.import_authentication_settings(&ctx.master_file(path)).await?;
        Ok(DispatchOutcome::Completed(ok))
    }

    async fn remove(&self, _path: &ArtifactPath, _ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(DispatchOutcome::unsupported("authentication settings cannot be deleted"))
    }
}

/// Journeys; deletion prunes orphaned nodes
pub struct JourneyHandler {
    backend: Arc<dyn ConfigBackend>,
    confirm: Arc<dyn PruneConfirm>,
}

impl JourneyHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>, confirm: Arc<dyn PruneConfirm>) -> Self {
        Self { backend, confirm }
    }

    async fn prune(&self, ctx: &DispatchContext) -> Result<(), DispatchError> {
        let orphans = self.backend.find_orphaned_nodes().await?;
        if orphans.is_empty() {
            return Ok(());
        }
        if ctx.prompt_prune && !self.confirm.confirm_prune(&orphans) {
            tracing::info!(count = orphans.len(), "orphaned node pruning declined");
            return Ok(());
        }
        let removed = self.backend.remove_orphaned_nodes(&orphans).await?;
        tracing::info!(count = orphans.len(), removed, "pruned orphaned nodes");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for JourneyHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let file = ctx.master_file(path);
        let id = entity_id(&file)?;
        let options = ImportOptions::with_dependencies().reusing_uuids();
        Ok(DispatchOutcome::Completed(self.backend.import_journey(&id, &file, options).await?))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let id = entity_id(&ctx.export_file(path))?;
        let ok = self.backend.delete_journey(&id).await?;
        if ctx.no_prune {
            return Ok(DispatchOutcome::Completed(ok));
        }
        match self.prune(ctx).await {
            Ok(()) => Ok(DispatchOutcome::Completed(ok)),
            Err(err) => {
                tracing::warn!(journey = %id, error = %err, "orphaned node pruning failed");
                Ok(DispatchOutcome::CompletedWithWarning {
                    ok,
                    warning: format!("orphaned node pruning failed: {err}"),
                })
            }
        }
    }
}

/// Scripts; raw script bodies travel with their owning config
pub struct ScriptHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl ScriptHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for ScriptHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        if path.is_script_body() {
            return Ok(DispatchOutcome::skipped("script body imported with its config"));
        }
        let file = ctx.master_file(path);
        let entity = read_document(&file)?;
        let ok = self
            .backend
            .import_script(&entity.entity_id()?, &entity.entity_name()?, &file)
            .await?;
        Ok(DispatchOutcome::Completed(ok))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        if path.is_script_body() {
            return Ok(DispatchOutcome::skipped("script body removed with its config"));
        }
        let entity = read_document(&ctx.export_file(path))?;
        let ok = self
            .backend
            .delete_script(&entity.entity_id()?, &entity.entity_name()?)
            .await?;
        Ok(DispatchOutcome::Completed(ok))
    }
}

/// Services; global services are singletons and never cleaned
pub struct ServiceHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl ServiceHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for ServiceHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let global = path.scope() == Scope::Global;
        let ok = self.backend.import_service(&ctx.master_file(path), !global, global).await?;
        Ok(DispatchOutcome::Completed(ok))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let global = path.scope() == Scope::Global;
        let id = entity_id(&ctx.export_file(path))?;
        let ok = self.backend.delete_service(&id, global).await?;
        if global && !ok {
            return Err(DispatchError::GlobalServiceDelete { id });
        }
        Ok(DispatchOutcome::Completed(ok))
    }
}

/// Resource types, deleted by name
pub struct ResourceTypeHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl ResourceTypeHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for ResourceTypeHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(DispatchOutcome::Completed(
            self.backend.import_resource_types(&ctx.master_file(path)).await?,
        ))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let name = entity_name(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_resource_type(&name).await?))
    }
}

/// Authorization policies
pub struct PolicyHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl PolicyHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for PolicyHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let file = ctx.master_file(path);
        let id = entity_id(&file)?;
        let ok = self
            .backend
            .import_policy(&id, &file, ImportOptions::with_dependencies())
            .await?;
        Ok(DispatchOutcome::Completed(ok))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let id = entity_id(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_policy(&id).await?))
    }
}

/// Agents, dispatched by declared sub-type
pub struct AgentHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl AgentHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

fn agent_identity(file: &std::path::Path) -> Result<(AgentKind, String), DispatchError> {
    let doc = read_document(file)?;
    let entity = doc.entity()?;
    let kind = entity.type_id().map_or(AgentKind::Generic, AgentKind::from_type_id);
    let id = doc.entity_id()?;
    Ok((kind, id))
}

#[async_trait::async_trait]
impl ArtifactHandler for AgentHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let file = ctx.master_file(path);
        let (kind, id) = agent_identity(&file)?;
        Ok(DispatchOutcome::Completed(self.backend.import_agent(kind, &id, &file).await?))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        let (kind, id) = agent_identity(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_agent(kind, &id).await?))
    }
}
