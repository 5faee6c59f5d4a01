//! Per-type replay handlers
//!
//! Each [`ArtifactHandler`] knows how to apply (add or change) and remove
//! one artifact type through the [`ConfigBackend`](crate::ConfigBackend).
//! Handlers for added and changed artifacts share `apply`: imports are
//! upserts.
//!
//! Applied artifacts are read from the master tree; removed artifacts only
//! exist in the export tree, so their ids are read from there.

mod access;
mod environment;
mod identity;
mod inert;

pub use access::{
    AgentHandler, AuthenticationHandler, JourneyHandler, OAuth2ClientHandler, PolicyHandler,
    ResourceTypeHandler, ScriptHandler, ServiceHandler,
};
pub use environment::{SecretHandler, VariableHandler};
pub use identity::{EmailTemplateHandler, IdmHandler, ManagedApplicationHandler, MappingHandler, ThemeHandler};
pub use inert::InertHandler;

use crate::error::DispatchError;
use envpromo_artifact::{ArtifactDocument, ArtifactPath};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Per-run settings visible to handlers
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    pub master_dir: PathBuf,
    pub export_dir: PathBuf,
    pub effect_secrets: bool,
    pub prompt_prune: bool,
    pub no_prune: bool,
}

impl DispatchContext {
    /// File to import for an added or changed artifact
    #[inline]
    #[must_use]
    pub fn master_file(&self, path: &ArtifactPath) -> PathBuf {
        self.master_dir.join(path.as_str())
    }

    /// File describing an artifact to remove
    #[inline]
    #[must_use]
    pub fn export_file(&self, path: &ArtifactPath) -> PathBuf {
        self.export_dir.join(path.as_str())
    }
}

/// What a handler did with a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Backend was called; `bool` is its success indicator
    Completed(bool),
    /// Primary call completed but a follow-up step failed
    CompletedWithWarning { ok: bool, warning: String },
    /// Deliberately not acted on
    Skipped(String),
    /// Promoted through another artifact type
    Delegated(String),
    /// No operation exists for this type and direction
    Unsupported(String),
}

impl DispatchOutcome {
    pub(crate) fn skipped(reason: &str) -> Self {
        Self::Skipped(reason.to_string())
    }

    pub(crate) fn delegated(reason: &str) -> Self {
        Self::Delegated(reason.to_string())
    }

    pub(crate) fn unsupported(reason: &str) -> Self {
        Self::Unsupported(reason.to_string())
    }
}

impl Display for DispatchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(ok) => write!(f, "{ok}"),
            Self::CompletedWithWarning { ok, warning } => write!(f, "{ok} (warning: {warning})"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Delegated(reason) => write!(f, "delegated ({reason})"),
            Self::Unsupported(reason) => write!(f, "unsupported ({reason})"),
        }
    }
}

/// Replay operations for one artifact type
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArtifactHandler: Send + Sync {
    /// Create or update the artifact from the master tree
    async fn apply(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError>;

    /// Remove the artifact described in the export tree
    async fn remove(&self, path: &ArtifactPath, ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError>;
}

fn read_document(file: &Path) -> Result<ArtifactDocument, DispatchError> {
    Ok(ArtifactDocument::read(file)?)
}

fn entity_id(file: &Path) -> Result<String, DispatchError> {
    Ok(read_document(file)?.entity_id()?)
}

fn entity_name(file: &Path) -> Result<String, DispatchError> {
    Ok(read_document(file)?.entity_name()?)
}
