//! Environment-impact detection
//!
//! Variables are global, so the check runs on the full diff rather than a
//! realm partition.

use envpromo_diff::DiffResult;

const VARIABLE_SEGMENT: &str = "global/variable";

/// Whether any diffed path touches an environment variable
#[must_use]
pub fn environment_changed(diff: &DiffResult) -> bool {
    diff.iter().any(|path| path.as_str().contains(VARIABLE_SEGMENT))
}
