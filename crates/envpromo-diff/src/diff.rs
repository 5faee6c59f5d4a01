//! Tree differ
//!
//! Walks an export tree (present state) and a master tree (desired state)
//! and classifies every promotable artifact as added, changed or deleted.
//!
//! Naming follows the promotion direction: `added` artifacts exist only in
//! the master tree and must be created in the tenant, `deleted` artifacts
//! exist only in the export tree and must be removed from it.

use crate::error::DiffError;
use envpromo_artifact::{equivalent, ArtifactPath, ContentHash, Scope, VolatileFilter};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Classified difference between two trees
///
/// Lists are sorted lexicographically after the walk. The sort is a
/// normalization step; the walk itself guarantees no order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiffResult {
    /// Present only in the master tree
    pub added: Vec<ArtifactPath>,
    /// Present in both, semantically different
    pub changed: Vec<ArtifactPath>,
    /// Present only in the export tree
    pub deleted: Vec<ArtifactPath>,
}

impl DiffResult {
    /// Empty diff
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of paths across all three lists
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.changed.len() + self.deleted.len()
    }

    /// Whether the trees are equivalent
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort all three lists
    pub fn normalize(&mut self) {
        self.added.sort();
        self.changed.sort();
        self.deleted.sort();
    }

    /// Iterate over every path: added, then changed, then deleted
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactPath> {
        self.added.iter().chain(&self.changed).chain(&self.deleted)
    }

    /// Paths owned by `scope`, preserving order within each list
    #[must_use]
    pub fn filter_scope(&self, scope: &Scope) -> Self {
        let keep = |paths: &[ArtifactPath]| -> Vec<ArtifactPath> {
            paths.iter().filter(|p| p.scope() == *scope).cloned().collect()
        };
        Self {
            added: keep(&self.added),
            changed: keep(&self.changed),
            deleted: keep(&self.deleted),
        }
    }
}

/// Differ over a pair of tree roots
#[derive(Debug, Clone)]
pub struct TreeDiffer {
    export_dir: PathBuf,
    master_dir: PathBuf,
}

impl TreeDiffer {
    /// Create differ for `export_dir` (current tenant state) against
    /// `master_dir` (desired state)
    #[must_use]
    pub fn new(export_dir: impl Into<PathBuf>, master_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            master_dir: master_dir.into(),
        }
    }

    /// Compute the diff
    ///
    /// # Errors
    /// Returns error if either root is missing, a directory cannot be
    /// enumerated, or a file present in both trees cannot be read.
    pub fn run(&self) -> Result<DiffResult, DiffError> {
        let export_files = walk(&self.export_dir)?;
        let master_files = walk(&self.master_dir)?;
        let mut result = DiffResult::new();

        for path in &export_files {
            let classification = path.classify();
            if !classification.promotable {
                tracing::debug!(path = %path, "skipping non-promotable artifact");
                continue;
            }

            let export_file = self.export_dir.join(path.as_str());
            let master_file = self.master_dir.join(path.as_str());
            if !master_file.is_file() {
                tracing::debug!(path = %path, "deleted");
                result.deleted.push(path.clone());
                continue;
            }

            if ContentHash::of_file(&export_file)? == ContentHash::of_file(&master_file)? {
                continue;
            }
            // Unfiltered types compare bytes only; the hashes already differ.
            let filtered = !VolatileFilter::for_path(path).is_none();
            if filtered && equivalent(&export_file, &master_file, path) {
                tracing::debug!(path = %path, "differs only in volatile fields");
                continue;
            }
            tracing::debug!(path = %path, "changed");
            result.changed.push(path.clone());
        }

        for path in &master_files {
            if !path.classify().promotable {
                continue;
            }
            if !self.export_dir.join(path.as_str()).is_file() {
                tracing::debug!(path = %path, "added");
                result.added.push(path.clone());
            }
        }

        result.normalize();
        tracing::info!(
            added = result.added.len(),
            changed = result.changed.len(),
            deleted = result.deleted.len(),
            "diff complete"
        );
        Ok(result)
    }
}

/// Diff `export_dir` against `master_dir`
///
/// # Errors
/// See [`TreeDiffer::run`].
pub fn diff_trees(export_dir: &Path, master_dir: &Path) -> Result<DiffResult, DiffError> {
    TreeDiffer::new(export_dir, master_dir).run()
}

/// Every regular, non-housekeeping file below `root`, as relative paths
fn walk(root: &Path) -> Result<Vec<ArtifactPath>, DiffError> {
    if !root.is_dir() {
        return Err(DiffError::MissingDirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let entries = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in entries {
        let entry = entry.map_err(|source| DiffError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(path) = ArtifactPath::from_relative(relative) else {
            tracing::warn!(path = %relative.display(), "skipping file with non-UTF-8 name");
            continue;
        };
        if !path.is_housekeeping() {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn walk_skips_git_and_readme() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".git/HEAD", "ref");
        touch(dir.path(), "README.md", "docs");
        touch(dir.path(), "global/README.md", "docs");
        touch(dir.path(), "global/script/s.script.json", "{}");

        let files = walk(dir.path()).unwrap();
        assert_eq!(files, vec![ArtifactPath::new("global/script/s.script.json")]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = diff_trees(&dir.path().join("nope"), dir.path());
        assert!(matches!(result, Err(DiffError::MissingDirectory(_))));
    }

    #[test]
    fn identical_trees_produce_empty_diff() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for root in [a.path(), b.path()] {
            touch(root, "realm/alpha/script/s.script.json", r#"{"_id":"s"}"#);
        }
        assert!(diff_trees(a.path(), b.path()).unwrap().is_empty());
    }

    #[test]
    fn unfiltered_byte_change_is_changed() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        touch(a.path(), "realm/alpha/script/s.script.json", r#"{"_id":"s"}"#);
        touch(b.path(), "realm/alpha/script/s.script.json", r#"{ "_id": "s" }"#);
        let diff = diff_trees(a.path(), b.path()).unwrap();
        assert_eq!(diff.changed, vec![ArtifactPath::new("realm/alpha/script/s.script.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_skipped_in_both_trees() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for root in [a.path(), b.path()] {
            let dir = root.join("realm/alpha/script");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(OsStr::from_bytes(b"s\xff.script.json")), r#"{"_id":"s"}"#).unwrap();
        }
        touch(b.path(), "realm/alpha/script/t.script.json", r#"{"_id":"t"}"#);

        let diff = diff_trees(a.path(), b.path()).unwrap();
        assert_eq!(diff.added, vec![ArtifactPath::new("realm/alpha/script/t.script.json")]);
        assert!(diff.deleted.is_empty());
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn filter_scope_keeps_order() {
        let diff = DiffResult {
            added: vec!["realm/a/x/1.json".into(), "global/x/2.json".into(), "realm/a/x/3.json".into()],
            changed: vec![],
            deleted: vec!["realm/b/x/4.json".into()],
        };
        let part = diff.filter_scope(&Scope::Realm("a".into()));
        assert_eq!(part.added, vec![ArtifactPath::new("realm/a/x/1.json"), ArtifactPath::new("realm/a/x/3.json")]);
        assert!(part.deleted.is_empty());
    }
}
