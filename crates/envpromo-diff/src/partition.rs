//! Realm partitioner
//!
//! Splits a [`DiffResult`] by owning realm so replay can be scoped and
//! sequenced realm by realm.

use crate::diff::DiffResult;
use envpromo_artifact::Scope;
use indexmap::{IndexMap, IndexSet};

/// Every scope touched by `diff`, in discovery order
///
/// Discovery walks added, then changed, then deleted paths.
#[must_use]
pub fn discover_realms(diff: &DiffResult) -> IndexSet<Scope> {
    diff.iter().map(|p| p.scope()).collect()
}

/// Per-scope view of a diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealmPartition {
    parts: IndexMap<Scope, DiffResult>,
}

impl RealmPartition {
    /// Partition `diff` over `realms`
    ///
    /// Each part is recomputed by filtering the full lists; the source diff
    /// is never mutated.
    #[must_use]
    pub fn new(diff: &DiffResult, realms: &IndexSet<Scope>) -> Self {
        let parts = realms
            .iter()
            .map(|scope| (scope.clone(), diff.filter_scope(scope)))
            .collect();
        Self { parts }
    }

    /// Partition `diff` over the realms it touches
    #[must_use]
    pub fn of(diff: &DiffResult) -> Self {
        Self::new(diff, &discover_realms(diff))
    }

    /// Part for one scope
    #[inline]
    #[must_use]
    pub fn get(&self, scope: &Scope) -> Option<&DiffResult> {
        self.parts.get(scope)
    }

    /// Scopes in discovery order
    pub fn realms(&self) -> impl Iterator<Item = &Scope> {
        self.parts.keys()
    }

    /// Parts in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&Scope, &DiffResult)> {
        self.parts.iter()
    }

    /// Number of scopes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no scope was touched
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envpromo_artifact::ArtifactPath;

    fn sample() -> DiffResult {
        DiffResult {
            added: vec![
                ArtifactPath::new("realm/bravo/policy/b.json"),
                ArtifactPath::new("global/variable/v.json"),
            ],
            changed: vec![ArtifactPath::new("realm/alpha/script/s.json")],
            deleted: vec![ArtifactPath::new("realm/bravo/journey/j.json")],
        }
    }

    #[test]
    fn realms_in_discovery_order() {
        let realms: Vec<_> = discover_realms(&sample()).into_iter().collect();
        assert_eq!(
            realms,
            vec![
                Scope::Realm("bravo".into()),
                Scope::Global,
                Scope::Realm("alpha".into())
            ]
        );
    }

    #[test]
    fn parts_are_filtered_per_scope() {
        let partition = RealmPartition::of(&sample());
        assert_eq!(partition.len(), 3);

        let bravo = partition.get(&Scope::Realm("bravo".into())).unwrap();
        assert_eq!(bravo.added.len(), 1);
        assert_eq!(bravo.deleted.len(), 1);
        assert!(bravo.changed.is_empty());

        let global = partition.get(&Scope::Global).unwrap();
        assert_eq!(global.added, vec![ArtifactPath::new("global/variable/v.json")]);
    }

    #[test]
    fn realm_named_like_global_segment_does_not_capture_global_paths() {
        let diff = DiffResult {
            added: vec![
                ArtifactPath::new("global/idm/x.json"),
                ArtifactPath::new("realm/idm/policy/p.json"),
            ],
            ..DiffResult::default()
        };
        let partition = RealmPartition::of(&diff);
        assert_eq!(partition.get(&Scope::Realm("idm".into())).unwrap().added.len(), 1);
        assert_eq!(partition.get(&Scope::Global).unwrap().added.len(), 1);
    }

    #[test]
    fn empty_diff_has_no_parts() {
        assert!(RealmPartition::of(&DiffResult::default()).is_empty());
    }
}
