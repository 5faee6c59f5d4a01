//! Error types for the promotion engine
//!
//! Provides error handling for:
//! - Backend (SDK) calls
//! - Per-path dispatch, which never aborts a run
//! - Setup failures, which do
//! - Option files

use envpromo_artifact::DocumentError;
use envpromo_diff::DiffError;
use std::path::PathBuf;

/// Errors reported by a [`ConfigBackend`](crate::ConfigBackend) call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Remote request failed
    #[error("request failed: {0}")]
    Request(String),

    /// Entity does not exist in the tenant
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The tenant rejected the operation
    #[error("operation rejected: {0}")]
    Rejected(String),
}

/// Errors from replaying a single path
///
/// Caught by the dispatcher, logged, and recorded; replay continues.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Export file unreadable or missing the entity id
    #[error("artifact document: {0}")]
    Document(#[from] DocumentError),

    /// Backend call failed
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    /// Global singleton services cannot be deleted and recreated
    #[error("global service {id} cannot be deleted")]
    GlobalServiceDelete { id: String },

    /// Realm context could not be switched before the call
    #[error("cannot switch to realm {realm}: {source}")]
    RealmSwitch {
        realm: String,
        #[source]
        source: BackendError,
    },
}

/// Errors that abort a promotion run
#[derive(Debug, thiserror::Error)]
pub enum PromotionError {
    /// Master or export tree is missing
    #[error("{role} directory not found: {path}")]
    MissingDirectory { role: &'static str, path: PathBuf },

    /// Diffing failed
    #[error("diff failed: {0}")]
    Diff(#[from] DiffError),

    /// Snapshot could not be written
    #[error("failed to write snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be serialized
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors loading promotion options
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options file: {0}")]
    Parse(#[from] toml::de::Error),
}
