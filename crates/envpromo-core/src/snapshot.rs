//! Diff and audit-log snapshots
//!
//! Written only when `print_diff` is set:
//! - `a1fileDiff.config.json`: the diff, right after diffing
//! - `a2fileDiff.config.json`: the audit log, after replay

use crate::error::PromotionError;
use envpromo_diff::DiffResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name of the diff snapshot
pub const DIFF_SNAPSHOT: &str = "a1fileDiff.config.json";

/// File name of the audit-log snapshot
pub const LOG_SNAPSHOT: &str = "a2fileDiff.config.json";

/// Write the diff as `{ added, changed, deleted }`
///
/// # Errors
/// Returns error if the snapshot cannot be serialized or written
pub fn write_diff_snapshot(dir: &Path, diff: &DiffResult) -> Result<PathBuf, PromotionError> {
    write_json(&dir.join(DIFF_SNAPSHOT), diff)
}

/// Write the audit log lines as a JSON array
///
/// # Errors
/// Returns error if the snapshot cannot be serialized or written
pub fn write_log_snapshot(dir: &Path, messages: &[String]) -> Result<PathBuf, PromotionError> {
    write_json(&dir.join(LOG_SNAPSHOT), &messages)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, PromotionError> {
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json).map_err(|source| PromotionError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "snapshot written");
    Ok(path.to_path_buf())
}
