//! Environment variable and secret handlers
//!
//! Both are gated on `effect_secrets`. Secret writes are not wired to the
//! backend: when enabled they are logged and reported unsupported.

use super::{entity_id, ArtifactHandler, DispatchContext, DispatchOutcome};
use crate::backend::ConfigBackend;
use crate::error::DispatchError;
use envpromo_artifact::ArtifactPath;
use std::sync::Arc;

const SECRETS_DISABLED: &str = "effect secrets disabled";

/// Environment variables (ESVs)
pub struct VariableHandler {
    backend: Arc<dyn ConfigBackend>,
}

impl VariableHandler {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for VariableHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        if !ctx.effect_secrets {
            return Ok(DispatchOutcome::skipped(SECRETS_DISABLED));
        }
        let file = ctx.master_file(path);
        let id = entity_id(&file)?;
        Ok(DispatchOutcome::Completed(self.backend.import_variable(&id, &file).await?))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        if !ctx.effect_secrets {
            return Ok(DispatchOutcome::skipped(SECRETS_DISABLED));
        }
        let id = entity_id(&ctx.export_file(path))?;
        Ok(DispatchOutcome::Completed(self.backend.delete_variable(&id).await?))
    }
}

/// Secrets; never written
#[derive(Debug, Default)]
pub struct SecretHandler;

impl SecretHandler {
    fn outcome(path: &ArtifactPath, ctx: &DispatchContext, action: &str) -> DispatchOutcome {
        if !ctx.effect_secrets {
            return DispatchOutcome::skipped(SECRETS_DISABLED);
        }
        tracing::warn!(path = %path, action, "secret change not applied; secrets are promoted separately");
        DispatchOutcome::unsupported("secret writes are not applied")
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for SecretHandler {
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(Self::outcome(path, ctx, "apply"))
    }

    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(Self::outcome(path, ctx, "remove"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Trees;
    use crate::plan::{PlanBackend, PlannedCall};
    use envpromo_test_utils::fixtures;
    use pretty_assertions::assert_eq;

    const VARIABLE: &str = "global/variable/esv-api-url.variable.json";

    #[tokio::test]
    async fn variable_skipped_without_effect_secrets() {
        let trees = Trees::new();
        trees.master.write_json(VARIABLE, &fixtures::variable("esv-api-url", "aHR0cHM6Ly9hcGk="));
        let backend = Arc::new(PlanBackend::new());
        let handler = VariableHandler::new(backend.clone());

        let outcome = handler.apply(&ArtifactPath::new(VARIABLE), &trees.ctx()).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Skipped(SECRETS_DISABLED.into()));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn variable_imported_with_effect_secrets() {
        let trees = Trees::new();
        trees.master.write_json(VARIABLE, &fixtures::variable("esv-api-url", "aHR0cHM6Ly9hcGk="));
        let backend = Arc::new(PlanBackend::new());
        let handler = VariableHandler::new(backend.clone());
        let ctx = DispatchContext { effect_secrets: true, ..trees.ctx() };

        handler.apply(&ArtifactPath::new(VARIABLE), &ctx).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![PlannedCall::ImportVariable { id: "esv-api-url".into(), file: trees.master.path(VARIABLE) }]
        );
    }

    #[tokio::test]
    async fn secret_never_mutates() {
        let trees = Trees::new();
        let path = ArtifactPath::new("global/secret/esv-admin-password.secret.json");
        let ctx = DispatchContext { effect_secrets: true, ..trees.ctx() };

        assert!(matches!(
            SecretHandler.apply(&path, &ctx).await.unwrap(),
            DispatchOutcome::Unsupported(_)
        ));
        assert!(matches!(
            SecretHandler.remove(&path, &trees.ctx()).await.unwrap(),
            DispatchOutcome::Skipped(_)
        ));
    }
}
