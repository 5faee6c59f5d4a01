//! Promotion orchestrator
//!
//! Drives one promotion through
//! `Idle -> Diffing -> (ReportOnly | Partitioning -> Replaying -> ImpactCheck
//! -> [Refreshing]) -> Done`, entering `Failed` on any setup error.
//!
//! Replay is best-effort and not transactional: per-path failures are
//! recorded in the report and never abort the run.

use crate::backend::ConfigBackend;
use crate::confirm::PruneConfirm;
use crate::config::PromotionOptions;
use crate::error::PromotionError;
use crate::handlers::{DispatchContext, DispatchOutcome};
use crate::impact::environment_changed;
use crate::registry::HandlerRegistry;
use crate::replay::ReplayDispatcher;
use crate::run::{Phase, PromotionReport, PromotionRun, RefreshOutcome, RunState, StepOutcome, StepRecord};
use crate::snapshot;
use envpromo_artifact::{ArtifactPath, Scope};
use envpromo_diff::{discover_realms, DiffResult, RealmPartition, TreeDiffer};
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

/// Runs promotions against one backend
pub struct Promoter {
    backend: Arc<dyn ConfigBackend>,
    registry: HandlerRegistry,
}

impl Promoter {
    /// Promoter with the default handler for every known type
    #[must_use]
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        let registry = HandlerRegistry::with_defaults(backend.clone());
        Self { backend, registry }
    }

    /// Promoter whose journey handler asks `confirm` before pruning
    #[must_use]
    pub fn with_confirm(backend: Arc<dyn ConfigBackend>, confirm: Arc<dyn PruneConfirm>) -> Self {
        let registry = HandlerRegistry::with_backend(backend.clone(), confirm);
        Self { backend, registry }
    }

    /// Promoter with a custom registry
    #[must_use]
    pub fn with_registry(backend: Arc<dyn ConfigBackend>, registry: HandlerRegistry) -> Self {
        Self { backend, registry }
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Promote `master` onto the tenant currently matching `export`
    ///
    /// # Errors
    /// Returns error if either directory is missing, a tree cannot be
    /// walked, or the diff snapshot cannot be written. Per-path replay
    /// failures are reported in [`PromotionReport::steps`] instead.
    pub async fn promote(
        &self,
        master: &Path,
        export: &Path,
        options: &PromotionOptions,
    ) -> Result<PromotionReport, PromotionError> {
        let mut run = PromotionRun::new();
        let span = tracing::info_span!(
            "promotion",
            run_id = %run.id(),
            master = %master.display(),
            export = %export.display(),
        );

        let result = self.execute(&mut run, master, export, options).instrument(span).await;
        if let Err(err) = &result {
            run.transition(RunState::Failed);
            tracing::error!(run_id = %run.id(), error = %err, "promotion failed");
        }
        result
    }

    async fn execute(
        &self,
        run: &mut PromotionRun,
        master: &Path,
        export: &Path,
        options: &PromotionOptions,
    ) -> Result<PromotionReport, PromotionError> {
        run.transition(RunState::Diffing);
        require_dir("master", master)?;
        require_dir("export", export)?;

        let diff = TreeDiffer::new(export, master).run()?;
        if options.print_diff {
            snapshot::write_diff_snapshot(&options.snapshot_dir, &diff)?;
        }
        let changed_env = environment_changed(&diff);

        if options.what_if {
            run.transition(RunState::ReportOnly);
            run.log(format!(
                "what-if: {} added, {} changed, {} deleted",
                diff.added.len(),
                diff.changed.len(),
                diff.deleted.len()
            ));
            run.transition(RunState::Done);
            return Ok(std::mem::take(run).into_report(diff, Vec::new(), changed_env, RefreshOutcome::DryRun));
        }

        run.transition(RunState::Partitioning);
        let realms = discover_realms(&diff);
        let partition = RealmPartition::new(&diff, &realms);
        tracing::info!(realms = partition.len(), "partitioned diff");

        run.transition(RunState::Replaying);
        let ctx = DispatchContext {
            master_dir: master.to_path_buf(),
            export_dir: export.to_path_buf(),
            effect_secrets: options.effect_secrets,
            prompt_prune: options.prompt_prune,
            no_prune: options.no_prune,
        };
        let dispatcher = ReplayDispatcher::new(self.backend.as_ref(), &self.registry, options, &ctx);
        for (scope, part) in partition.iter() {
            let span = tracing::info_span!("realm", realm = %scope);
            dispatcher.replay(scope, part, run).instrument(span).await;
        }
        self.reapply_global_sync(&diff, &ctx, run).await;

        run.transition(RunState::ImpactCheck);
        let refresh = if !changed_env {
            RefreshOutcome::NotNeeded
        } else if !options.effect_secrets {
            tracing::info!("variables changed; environment refresh requires effect secrets");
            run.log("environment changed; refresh skipped without effect secrets");
            RefreshOutcome::NotEffected
        } else {
            run.transition(RunState::Refreshing);
            self.refresh(options.wait, run).await
        };
        run.transition(RunState::Done);

        if options.print_diff {
            if let Err(err) = snapshot::write_log_snapshot(&options.snapshot_dir, run.log_messages()) {
                tracing::error!(error = %err, "log snapshot not written");
            }
        }

        let realms = realms.into_iter().collect();
        Ok(std::mem::take(run).into_report(diff, realms, changed_env, refresh))
    }

    /// Re-apply global sync aggregates through the mapping import
    async fn reapply_global_sync(&self, diff: &DiffResult, ctx: &DispatchContext, run: &mut PromotionRun) {
        let aggregates = diff
            .added
            .iter()
            .map(|p| (Phase::Add, p))
            .chain(diff.changed.iter().map(|p| (Phase::Change, p)))
            .filter(|(_, p)| p.is_sync_aggregate() && p.scope() == Scope::Global);

        for (phase, path) in aggregates {
            let outcome = match self.backend.import_mapping(None, &ctx.master_file(path)).await {
                Ok(ok) => {
                    tracing::info!(%path, ok, "global sync re-applied");
                    run.log(format!("sync {path}: {ok}"));
                    StepOutcome::Ok(DispatchOutcome::Completed(ok))
                }
                Err(err) => {
                    tracing::error!(%path, error = %err, "global sync re-apply failed");
                    run.log(format!("sync {path} failed: {err}"));
                    StepOutcome::Failed(err.to_string())
                }
            };
            run.record(global_step(phase, path, outcome));
        }
    }

    async fn refresh(&self, wait: bool, run: &mut PromotionRun) -> RefreshOutcome {
        if wait {
            tracing::info!("applying environment updates, takes around 10 minutes");
        } else {
            tracing::info!("requesting environment updates");
        }
        match self.backend.apply_environment_updates(wait).await {
            Ok(accepted) => {
                run.log(format!("environment refresh: {accepted}"));
                RefreshOutcome::Applied { waited: wait, accepted }
            }
            Err(err) => {
                tracing::error!(error = %err, "environment refresh failed");
                run.log(format!("environment refresh failed: {err}"));
                RefreshOutcome::Failed(err.to_string())
            }
        }
    }
}

impl std::fmt::Debug for Promoter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promoter").field("registry", &self.registry).finish_non_exhaustive()
    }
}

fn global_step(phase: Phase, path: &ArtifactPath, outcome: StepOutcome) -> StepRecord {
    StepRecord {
        realm: Scope::Global,
        phase,
        path: path.clone(),
        artifact_type: path.artifact_type(),
        outcome,
    }
}

fn require_dir(role: &'static str, path: &Path) -> Result<(), PromotionError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PromotionError::MissingDirectory {
            role,
            path: path.to_path_buf(),
        })
    }
}
