//! Replay dispatcher
//!
//! Replays one realm partition against the backend: added paths, then
//! changed, then deleted. Each path goes to the handler registered for its
//! type. A failing path is logged and recorded; the next path still runs.

use crate::backend::ConfigBackend;
use crate::config::PromotionOptions;
use crate::error::{BackendError, DispatchError};
use crate::handlers::{ArtifactHandler, DispatchContext, DispatchOutcome};
use crate::registry::HandlerRegistry;
use crate::run::{Phase, PromotionRun, StepOutcome, StepRecord};
use envpromo_artifact::{ArtifactPath, Scope};
use envpromo_diff::DiffResult;

/// Dispatches diff paths to their handlers
pub struct ReplayDispatcher<'a> {
    backend: &'a dyn ConfigBackend,
    registry: &'a HandlerRegistry,
    options: &'a PromotionOptions,
    ctx: &'a DispatchContext,
}

impl<'a> ReplayDispatcher<'a> {
    #[must_use]
    pub fn new(
        backend: &'a dyn ConfigBackend,
        registry: &'a HandlerRegistry,
        options: &'a PromotionOptions,
        ctx: &'a DispatchContext,
    ) -> Self {
        Self {
            backend,
            registry,
            options,
            ctx,
        }
    }

    /// Replay one partition in add, change, delete order
    pub async fn replay(&self, scope: &Scope, part: &DiffResult, run: &mut PromotionRun) {
        let phases = [
            (Phase::Add, &part.added),
            (Phase::Change, &part.changed),
            (Phase::Delete, &part.deleted),
        ];
        for (phase, paths) in phases {
            for path in paths {
                self.dispatch(scope, phase, path, run).await;
            }
        }
    }

    /// Dispatch one path and record its outcome
    pub async fn dispatch(&self, scope: &Scope, phase: Phase, path: &ArtifactPath, run: &mut PromotionRun) {
        let artifact_type = path.artifact_type();
        let outcome = match self.registry.get(&artifact_type) {
            None => {
                let action = if phase.is_removal() { "delete" } else { "add" };
                let message = format!("missed {action} for {path} with type {artifact_type}");
                tracing::warn!(%path, %artifact_type, "{message}");
                run.log(message);
                StepOutcome::Missed
            }
            Some(handler) => match self.run_handler(handler.as_ref(), phase, path, run).await {
                Ok(outcome) => {
                    tracing::info!(%path, %phase, %outcome, "dispatched");
                    run.log(format!("{phase} {path}: {outcome}"));
                    StepOutcome::Ok(outcome)
                }
                Err(err) => {
                    tracing::error!(%path, %phase, error = %err, "dispatch failed");
                    run.log(format!("{phase} {path} failed: {err}"));
                    StepOutcome::Failed(err.to_string())
                }
            },
        };

        run.record(StepRecord {
            realm: scope.clone(),
            phase,
            path: path.clone(),
            artifact_type,
            outcome,
        });
    }

    async fn run_handler(
        &self,
        handler: &dyn ArtifactHandler,
        phase: Phase,
        path: &ArtifactPath,
        run: &mut PromotionRun,
    ) -> Result<DispatchOutcome, DispatchError> {
        if let Scope::Realm(folder) = path.scope() {
            self.switch_realm(&folder, run).await?;
        }
        if phase.is_removal() {
            handler.remove(path, self.ctx).await
        } else {
            handler.apply(path, self.ctx).await
        }
    }

    async fn switch_realm(&self, folder: &str, run: &mut PromotionRun) -> Result<(), DispatchError> {
        let realm = self.options.runtime_realm(folder);
        if run.active_realm() == Some(realm) {
            return Ok(());
        }

        let switched = self
            .backend
            .set_realm(realm)
            .await
            .map_err(|source| DispatchError::RealmSwitch {
                realm: realm.to_string(),
                source,
            })?;
        if !switched {
            return Err(DispatchError::RealmSwitch {
                realm: realm.to_string(),
                source: BackendError::Rejected("realm switch refused".into()),
            });
        }

        tracing::debug!(realm, "active realm");
        run.set_active_realm(realm);
        Ok(())
    }
}
