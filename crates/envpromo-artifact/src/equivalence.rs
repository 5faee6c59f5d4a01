//! Type-aware equivalence of exported artifacts
//!
//! Exports carry bookkeeping fields (audit timestamps, `meta` envelopes,
//! explicit nulls) that change on every export. Before two files are
//! reported as changed, those fields are stripped and the remaining JSON
//! structures are compared. Object key order never matters.

use crate::artifact_type::ArtifactType;
use crate::hash::ContentHash;
use crate::path::ArtifactPath;
use serde_json::Value;
use std::path::Path;

/// Audit fields written by the policy engine
const AUDIT_KEYS: &[&str] = &["createdBy", "creationDate", "lastModifiedDate", "lastModifiedBy"];

const SYNC_KEYS: &[&str] = &["meta"];

const VARIABLE_KEYS: &[&str] = &["lastChangeDate", "lastChangedBy"];

/// Volatile-field filter registered for an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatileFilter {
    /// No filter; only byte-identical files are equivalent
    None,
    /// Remove these keys at every depth
    Keys(&'static [&'static str]),
    /// Remove every key whose value is `null`, at every depth
    NullValues,
}

impl VolatileFilter {
    /// Filter registered for an artifact path
    ///
    /// The `sync.json` aggregate is recognized by file name, since it lives
    /// below `idm` and would otherwise classify as a plain config entity.
    #[must_use]
    pub fn for_path(path: &ArtifactPath) -> Self {
        if path.is_sync_aggregate() {
            return Self::Keys(SYNC_KEYS);
        }
        Self::for_type(&path.artifact_type())
    }

    /// Filter registered for an artifact type
    #[must_use]
    pub fn for_type(artifact_type: &ArtifactType) -> Self {
        match artifact_type {
            ArtifactType::Policy | ArtifactType::ResourceType => Self::Keys(AUDIT_KEYS),
            ArtifactType::Application => Self::NullValues,
            ArtifactType::Variable => Self::Keys(VARIABLE_KEYS),
            _ => Self::None,
        }
    }

    /// Whether this filter does anything
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Strip volatile fields from `value` in place
    pub fn apply(&self, value: &mut Value) {
        match self {
            Self::None => {}
            Self::Keys(keys) => strip(value, &|key, _| keys.iter().any(|k| *k == key)),
            Self::NullValues => strip(value, &|_, v| v.is_null()),
        }
    }
}

fn strip(value: &mut Value, remove: &dyn Fn(&str, &Value) -> bool) {
    match value {
        Value::Object(map) => {
            map.retain(|k, v| !remove(k, v));
            for v in map.values_mut() {
                strip(v, remove);
            }
        }
        Value::Array(items) => {
            for v in items {
                strip(v, remove);
            }
        }
        _ => {}
    }
}

/// Whether two artifact files are semantically equal for `path`'s type
///
/// Types without a registered filter fall back to byte-hash comparison.
/// Unreadable or unparseable files are never equivalent: a spurious change
/// report is preferred over a suppressed one.
#[must_use]
pub fn equivalent(a: &Path, b: &Path, path: &ArtifactPath) -> bool {
    let filter = VolatileFilter::for_path(path);
    if filter.is_none() {
        return match (ContentHash::of_file(a), ContentHash::of_file(b)) {
            (Ok(ha), Ok(hb)) => ha == hb,
            _ => false,
        };
    }

    match (read_json(a), read_json(b)) {
        (Ok(mut va), Ok(mut vb)) => {
            filter.apply(&mut va);
            filter.apply(&mut vb);
            va == vb
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(path = %path, error = %e, "could not compare artifact, reporting as changed");
            false
        }
    }
}

/// Equivalence of two already-parsed values under `filter`
#[must_use]
pub fn equivalent_values(a: &Value, b: &Value, filter: VolatileFilter) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    filter.apply(&mut a);
    filter.apply(&mut b);
    a == b
}

fn read_json(path: &Path) -> Result<Value, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))
}
