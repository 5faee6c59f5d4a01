//! Error types for tree diffing

use envpromo_artifact::HashError;
use std::path::PathBuf;

/// Errors that abort a diff
///
/// Any of these leaves no partial result behind.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Tree root does not exist or is not a directory
    #[error("tree not found: {0}")]
    MissingDirectory(PathBuf),

    /// Directory enumeration failed
    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Artifact content could not be hashed
    #[error(transparent)]
    Hash(#[from] HashError),
}
