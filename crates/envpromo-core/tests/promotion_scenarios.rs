//! End-to-end promotion scenarios against the plan backend

use envpromo_core::prelude::*;
use envpromo_core::run::Phase;
use envpromo_core::snapshot::{DIFF_SNAPSHOT, LOG_SNAPSHOT};
use envpromo_test_utils::{fixtures, paths, ExportTree};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

const P1: &str = "realm/alpha/policy/p1.policy.authz.json";
const P2: &str = "realm/alpha/policy/p2.policy.authz.json";
const S1: &str = "realm/alpha/script/s1.script.json";

/// Master holds p1 at "v2" and a new p2; the tenant still has p1 at "v1"
/// and a script s1 that master dropped.
fn alpha_scenario() -> (ExportTree, ExportTree) {
    let master = ExportTree::new();
    master
        .write_json(P1, &fixtures::policy("p1", "v2"))
        .write_json(P2, &fixtures::policy("p2", "v1"));

    let export = ExportTree::new();
    export
        .write_json(P1, &fixtures::policy("p1", "v1"))
        .write_json(S1, &fixtures::script("s1", "Decision"));

    (master, export)
}

fn options(snapshots: &tempfile::TempDir) -> PromotionOptions {
    PromotionOptions::new().with_snapshot_dir(snapshots.path())
}

#[tokio::test]
async fn replays_add_change_delete_after_realm_switch() {
    let (master, export) = alpha_scenario();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());
    let promoter = Promoter::new(backend.clone());

    let report = promoter
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            PlannedCall::SetRealm { realm: "alpha".into() },
            PlannedCall::ImportPolicy {
                id: "p2".into(),
                file: master.path(P2),
                options: ImportOptions::with_dependencies(),
            },
            PlannedCall::ImportPolicy {
                id: "p1".into(),
                file: master.path(P1),
                options: ImportOptions::with_dependencies(),
            },
            PlannedCall::DeleteScript { id: "s1".into(), name: "Decision".into() },
        ]
    );
    let phases: Vec<_> = report.steps.iter().map(|s| s.phase).collect();
    assert_eq!(phases, vec![Phase::Add, Phase::Change, Phase::Delete]);
    assert!(report.failed_paths().is_empty());
    assert_eq!(report.realms, vec![Scope::Realm("alpha".into())]);
    assert!(!report.what_if);
}

#[tokio::test]
async fn what_if_reports_diff_without_backend_calls() {
    let (master, export) = alpha_scenario();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());
    let promoter = Promoter::new(backend.clone());

    let report = promoter
        .promote(master.root(), export.root(), &options(&snapshots).with_what_if(true))
        .await
        .unwrap();

    assert_eq!(report.diff.added, paths(&[P2]));
    assert_eq!(report.diff.changed, paths(&[P1]));
    assert_eq!(report.diff.deleted, paths(&[S1]));
    assert!(backend.calls().is_empty());
    assert_eq!(backend.mutation_count(), 0);
    assert!(report.what_if);
    assert!(report.steps.is_empty());
    assert_eq!(report.refresh, RefreshOutcome::DryRun);
}

#[tokio::test]
async fn global_sync_change_reapplied_once_via_mapping_import() {
    let master = ExportTree::new();
    master.write_json(
        "global/idm/sync.json",
        &json!({"meta": {"exportDate": "2024-02-01"}, "mappings": [{"name": "a", "source": "managed/user"}]}),
    );
    let export = ExportTree::new();
    export.write_json(
        "global/idm/sync.json",
        &json!({"meta": {"exportDate": "2024-01-01"}, "mappings": [{"name": "a", "source": "system/ldap"}]}),
    );
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert_eq!(
        backend.calls(),
        vec![PlannedCall::ImportMapping { id: None, file: master.path("global/idm/sync.json") }]
    );
    assert_eq!(report.diff.changed, paths(&["global/idm/sync.json"]));
    assert!(report.failed_paths().is_empty());
}

#[tokio::test]
async fn sync_meta_only_difference_is_not_reapplied() {
    let master = ExportTree::new();
    master.write_json("global/idm/sync.json", &json!({"meta": {"exportDate": "2024-02-01"}, "mappings": []}));
    let export = ExportTree::new();
    export.write_json("global/idm/sync.json", &json!({"meta": {"exportDate": "2024-01-01"}, "mappings": []}));
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert!(report.diff.is_empty());
    assert!(backend.calls().is_empty());
}

fn variable_scenario() -> (ExportTree, ExportTree) {
    let rel = "global/variable/esv-api-url.variable.json";
    let master = ExportTree::new();
    master.write_json(rel, &fixtures::variable("esv-api-url", "aHR0cHM6Ly9uZXc="));
    let export = ExportTree::new();
    export.write_json(rel, &fixtures::variable("esv-api-url", "aHR0cHM6Ly9vbGQ="));
    (master, export)
}

#[tokio::test]
async fn variable_change_without_effect_secrets_skips_refresh() {
    let (master, export) = variable_scenario();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert!(report.environment_changed);
    assert_eq!(report.refresh, RefreshOutcome::NotEffected);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn variable_change_with_effect_secrets_refreshes() {
    let (master, export) = variable_scenario();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());
    let opts = options(&snapshots).with_effect_secrets(true).with_wait(true);

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &opts)
        .await
        .unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            PlannedCall::ImportVariable {
                id: "esv-api-url".into(),
                file: master.path("global/variable/esv-api-url.variable.json"),
            },
            PlannedCall::ApplyEnvironmentUpdates { wait: true },
        ]
    );
    assert_eq!(report.refresh, RefreshOutcome::Applied { waited: true, accepted: true });
}

#[tokio::test]
async fn variable_audit_only_change_needs_no_refresh() {
    let rel = "global/variable/esv-api-url.variable.json";
    let master = ExportTree::new();
    let mut changed = fixtures::variable("esv-api-url", "aHR0cHM6Ly9hcGk=");
    changed["variable"]["esv-api-url"]["lastChangedBy"] = json!("someone-else");
    master.write_json(rel, &changed);
    let export = ExportTree::new();
    export.write_json(rel, &fixtures::variable("esv-api-url", "aHR0cHM6Ly9hcGk="));
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots).with_effect_secrets(true))
        .await
        .unwrap();

    assert!(!report.environment_changed);
    assert_eq!(report.refresh, RefreshOutcome::NotNeeded);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn print_diff_writes_both_snapshots() {
    let (master, export) = alpha_scenario();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend)
        .promote(master.root(), export.root(), &options(&snapshots).with_print_diff(true))
        .await
        .unwrap();

    let read = |name: &str| -> Value {
        serde_json::from_slice(&std::fs::read(snapshots.path().join(name)).unwrap()).unwrap()
    };
    assert_eq!(read(DIFF_SNAPSHOT), json!({"added": [P2], "changed": [P1], "deleted": [S1]}));
    assert_eq!(read(LOG_SNAPSHOT), json!(report.log_messages));
    assert_eq!(report.log_messages.len(), 3);
}

#[tokio::test]
async fn what_if_with_print_diff_writes_only_diff_snapshot() {
    let (master, export) = alpha_scenario();
    let snapshots = tempfile::tempdir().unwrap();

    Promoter::new(Arc::new(PlanBackend::new()))
        .promote(
            master.root(),
            export.root(),
            &options(&snapshots).with_what_if(true).with_print_diff(true),
        )
        .await
        .unwrap();

    assert!(snapshots.path().join(DIFF_SNAPSHOT).exists());
    assert!(!snapshots.path().join(LOG_SNAPSHOT).exists());
}

#[tokio::test]
async fn missing_directory_is_fatal() {
    let export = ExportTree::new();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());
    let missing = export.path("no-such-master");

    let err = Promoter::new(backend.clone())
        .promote(&missing, export.root(), &options(&snapshots))
        .await
        .unwrap_err();

    assert!(matches!(err, PromotionError::MissingDirectory { role: "master", .. }));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn failed_path_does_not_stop_replay() {
    let master = ExportTree::new();
    master
        .write_text(P2, "{ not json")
        .write_json(P1, &fixtures::policy("p1", "v2"));
    let export = ExportTree::new();
    export.write_json(P1, &fixtures::policy("p1", "v1"));
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert_eq!(report.failed_paths(), vec![&ArtifactPath::new(P2)]);
    assert!(backend.calls().contains(&PlannedCall::ImportPolicy {
        id: "p1".into(),
        file: master.path(P1),
        options: ImportOptions::with_dependencies(),
    }));
}

#[tokio::test]
async fn unknown_type_is_logged_as_missed() {
    let master = ExportTree::new();
    master.write_json("realm/alpha/widget/w1.json", &json!({"_id": "w1"}));
    let export = ExportTree::new();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend)
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert_eq!(report.steps[0].outcome, StepOutcome::Missed);
    assert_eq!(
        report.log_messages,
        vec!["missed add for realm/alpha/widget/w1.json with type widget".to_string()]
    );
}

#[tokio::test]
async fn root_realm_switches_through_alias() {
    let master = ExportTree::new();
    master.write_json("realm/root/policy/p9.policy.authz.json", &fixtures::policy("p9", "v1"));
    let export = ExportTree::new();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert_eq!(backend.calls()[0], PlannedCall::SetRealm { realm: "/".into() });
}

#[tokio::test]
async fn each_realm_switched_before_its_calls() {
    let master = ExportTree::new();
    master
        .write_json("realm/alpha/policy/a.policy.authz.json", &fixtures::policy("a", "v1"))
        .write_json("realm/bravo/policy/b.policy.authz.json", &fixtures::policy("b", "v1"));
    let export = ExportTree::new();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    let ids: Vec<String> = backend
        .calls()
        .into_iter()
        .map(|call| match call {
            PlannedCall::SetRealm { realm } => format!("realm:{realm}"),
            PlannedCall::ImportPolicy { id, .. } => format!("policy:{id}"),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(ids, vec!["realm:alpha", "policy:a", "realm:bravo", "policy:b"]);
    assert_eq!(
        report.realms,
        vec![Scope::Realm("alpha".into()), Scope::Realm("bravo".into())]
    );
}

#[tokio::test]
async fn non_promotable_types_never_replayed() {
    let master = ExportTree::new();
    master
        .write_json("realm/alpha/saml/idp.json", &json!({"_id": "idp"}))
        .write_json("realm/alpha/cot/circle.json", &json!({"_id": "circle"}))
        .write_json("realm/alpha/policyset/set.json", &json!({"_id": "set"}));
    let export = ExportTree::new();
    let snapshots = tempfile::tempdir().unwrap();
    let backend = Arc::new(PlanBackend::new());

    let report = Promoter::new(backend.clone())
        .promote(master.root(), export.root(), &options(&snapshots))
        .await
        .unwrap();

    assert!(report.diff.is_empty());
    assert!(backend.calls().is_empty());
}
