//! Environment promotion engine (envpromo-core)
//!
//! Promotes a "master" configuration export onto a live tenant whose
//! current state is captured in a second export:
//! 1. **Diff**: classify files as added, changed or deleted
//! 2. **Partition**: group paths by realm
//! 3. **Replay**: dispatch each path to its type's handler, realm by realm
//! 4. **Refresh**: apply environment updates when variables changed
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use envpromo_core::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(PlanBackend::new());
//! let promoter = Promoter::new(backend.clone());
//! let options = PromotionOptions::new().with_print_diff(true);
//!
//! let report = promoter.promote(master_dir, export_dir, &options).await?;
//! println!("{} steps, {} failed", report.steps.len(), report.failed_paths().len());
//! backend.write_json("plan.json")?;
//! ```

pub mod backend;
pub mod config;
pub mod confirm;
pub mod error;
pub mod handlers;
pub mod impact;
pub mod orchestrator;
pub mod plan;
pub mod registry;
pub mod replay;
pub mod run;
pub mod snapshot;

pub use backend::{AgentKind, ConfigBackend, ImportOptions};
pub use config::PromotionOptions;
pub use confirm::{AutoConfirm, Decline, PruneConfirm};
pub use error::{BackendError, ConfigError, DispatchError, PromotionError};
pub use handlers::{ArtifactHandler, DispatchContext, DispatchOutcome};
pub use impact::environment_changed;
pub use orchestrator::Promoter;
pub use plan::{PlanBackend, PlannedCall};
pub use registry::HandlerRegistry;
pub use replay::ReplayDispatcher;
pub use run::{Phase, PromotionReport, PromotionRun, RefreshOutcome, RunId, RunState, StepOutcome, StepRecord};

/// Common imports for driving a promotion
pub mod prelude {
    pub use crate::backend::{ConfigBackend, ImportOptions};
    pub use crate::config::PromotionOptions;
    pub use crate::error::{DispatchError, PromotionError};
    pub use crate::handlers::{ArtifactHandler, DispatchContext, DispatchOutcome};
    pub use crate::orchestrator::Promoter;
    pub use crate::plan::{PlanBackend, PlannedCall};
    pub use crate::registry::HandlerRegistry;
    pub use crate::run::{PromotionReport, RefreshOutcome, StepOutcome};
    pub use envpromo_artifact::{ArtifactPath, ArtifactType, Scope};
    pub use envpromo_diff::DiffResult;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
