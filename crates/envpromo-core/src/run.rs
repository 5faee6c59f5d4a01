//! Per-run promotion state
//!
//! A [`PromotionRun`] owns what one promotion accumulates while replaying:
//! audit log lines, per-step outcomes and the backend's active realm.
//! Nothing is shared between runs.

use crate::handlers::DispatchOutcome;
use chrono::{DateTime, Utc};
use envpromo_artifact::{ArtifactPath, ArtifactType, Scope};
use envpromo_diff::DiffResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique promotion run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Diffing,
    /// Dry run: diff reported, nothing replayed
    ReportOnly,
    Partitioning,
    Replaying,
    ImpactCheck,
    Refreshing,
    Done,
    Failed,
}

impl RunState {
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` may follow this state
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use RunState::{Diffing, Done, Failed, Idle, ImpactCheck, Partitioning, Refreshing, Replaying, ReportOnly};
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Idle, Diffing)
            | (Diffing, ReportOnly | Partitioning)
            | (ReportOnly, Done)
            | (Partitioning, Replaying)
            | (Replaying, ImpactCheck)
            | (ImpactCheck, Refreshing | Done)
            | (Refreshing, Done) => true,
            _ => false,
        }
    }
}

/// Replay phase of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Add,
    Change,
    Delete,
}

impl Phase {
    /// Whether this phase removes the artifact
    #[inline]
    #[must_use]
    pub fn is_removal(self) -> bool {
        self == Self::Delete
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one dispatched path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Handler ran
    Ok(DispatchOutcome),
    /// Handler or realm switch failed
    Failed(String),
    /// No handler for the type
    Missed,
}

impl StepOutcome {
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One replayed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub realm: Scope,
    pub phase: Phase,
    pub path: ArtifactPath,
    pub artifact_type: ArtifactType,
    pub outcome: StepOutcome,
}

/// Outcome of the trailing environment refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "refresh", content = "detail", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// No variable changed
    NotNeeded,
    /// Dry run; nothing was replayed
    DryRun,
    /// Variables changed but secrets were not effected
    NotEffected,
    /// Refresh requested
    Applied { waited: bool, accepted: bool },
    /// Refresh request failed; replay still completed
    Failed(String),
}

/// Mutable state of one promotion
#[derive(Debug)]
pub struct PromotionRun {
    id: RunId,
    state: RunState,
    what_if: bool,
    started_at: DateTime<Utc>,
    log_messages: Vec<String>,
    steps: Vec<StepRecord>,
    active_realm: Option<String>,
}

impl PromotionRun {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: RunId::new(),
            state: RunState::Idle,
            what_if: false,
            started_at: Utc::now(),
            log_messages: Vec::new(),
            steps: Vec::new(),
            active_realm: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RunId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Move to `next`
    pub fn transition(&mut self, next: RunState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = ?self.state, to = ?next, "unexpected run state transition");
        }
        tracing::debug!(from = ?self.state, to = ?next, "run state");
        self.what_if |= next == RunState::ReportOnly;
        self.state = next;
    }

    /// Append an audit line
    pub fn log(&mut self, message: impl Into<String>) {
        self.log_messages.push(message.into());
    }

    #[inline]
    #[must_use]
    pub fn log_messages(&self) -> &[String] {
        &self.log_messages
    }

    pub fn record(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Runtime realm the backend currently targets
    #[inline]
    #[must_use]
    pub fn active_realm(&self) -> Option<&str> {
        self.active_realm.as_deref()
    }

    pub fn set_active_realm(&mut self, realm: impl Into<String>) {
        self.active_realm = Some(realm.into());
    }

    /// Finish the run
    #[must_use]
    pub fn into_report(
        self,
        diff: DiffResult,
        realms: Vec<Scope>,
        environment_changed: bool,
        refresh: RefreshOutcome,
    ) -> PromotionReport {
        PromotionReport {
            run_id: self.id,
            state: self.state,
            what_if: self.what_if,
            started_at: self.started_at,
            finished_at: Utc::now(),
            diff,
            realms,
            log_messages: self.log_messages,
            steps: self.steps,
            environment_changed,
            refresh,
        }
    }
}

impl Default for PromotionRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a finished promotion produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionReport {
    pub run_id: RunId,
    pub state: RunState,
    /// Replay was skipped
    pub what_if: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub diff: DiffResult,
    /// Realms in replay order
    pub realms: Vec<Scope>,
    pub log_messages: Vec<String>,
    pub steps: Vec<StepRecord>,
    pub environment_changed: bool,
    pub refresh: RefreshOutcome,
}

impl PromotionReport {
    /// Paths whose step failed, in replay order
    #[must_use]
    pub fn failed_paths(&self) -> Vec<&ArtifactPath> {
        self.steps
            .iter()
            .filter(|s| s.outcome.is_failed())
            .map(|s| &s.path)
            .collect()
    }

    /// Paths with no registered handler
    #[must_use]
    pub fn missed_paths(&self) -> Vec<&ArtifactPath> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Missed)
            .map(|s| &s.path)
            .collect()
    }
}
