//! Testing utilities for envpromo workspace
//!
//! Shared export-tree builders and artifact fixtures.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use envpromo_artifact::ArtifactPath;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Export tree on disk, removed on drop
#[derive(Debug)]
pub struct ExportTree {
    dir: TempDir,
}

impl ExportTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp export tree"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write_text(&self, rel: &str, text: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create artifact directory");
        }
        std::fs::write(&path, text).expect("write artifact");
        self
    }

    pub fn write_json(&self, rel: &str, value: &Value) -> &Self {
        let text = serde_json::to_string_pretty(value).expect("serialize artifact");
        self.write_text(rel, &text)
    }

    pub fn remove(&self, rel: &str) -> &Self {
        std::fs::remove_file(self.path(rel)).expect("remove artifact");
        self
    }
}

impl Default for ExportTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert string literals to sorted artifact paths
pub fn paths(items: &[&str]) -> Vec<ArtifactPath> {
    let mut out: Vec<_> = items.iter().map(|s| ArtifactPath::new(*s)).collect();
    out.sort();
    out
}

/// Artifact fixtures in export-file shape
pub mod fixtures {
    use serde_json::{json, Value};

    pub fn policy(id: &str, description: &str) -> Value {
        json!({
            "meta": {"exportTool": "envpromo-test"},
            "policy": {
                id: {
                    "_id": id,
                    "name": id,
                    "description": description,
                    "active": true,
                    "lastModifiedBy": "id=admin",
                    "lastModifiedDate": "2024-01-01T00:00:00.000Z",
                    "createdBy": "id=admin",
                    "creationDate": "2024-01-01T00:00:00.000Z"
                }
            }
        })
    }

    pub fn script(id: &str, name: &str) -> Value {
        json!({
            "meta": {"exportTool": "envpromo-test"},
            "script": {id: {"_id": id, "name": name, "language": "JAVASCRIPT"}}
        })
    }

    pub fn variable(id: &str, value_base64: &str) -> Value {
        json!({
            "meta": {"exportTool": "envpromo-test"},
            "variable": {
                id: {
                    "_id": id,
                    "valueBase64": value_base64,
                    "lastChangeDate": "2024-01-01T00:00:00.000Z",
                    "lastChangedBy": "admin"
                }
            }
        })
    }

    pub fn oauth2_client(id: &str) -> Value {
        json!({
            "meta": {"exportTool": "envpromo-test"},
            "application": {id: {"_id": id, "coreOAuth2ClientConfig": {"status": "Active"}}}
        })
    }

    pub fn agent(id: &str, agent_type: &str) -> Value {
        json!({
            "agent": {id: {"_id": id, "_type": {"_id": agent_type}}}
        })
    }

    pub fn service(id: &str) -> Value {
        json!({
            "service": {id: {"_id": id, "_type": {"_id": id}}}
        })
    }

    pub fn journey(name: &str) -> Value {
        json!({
            "trees": {name: {"tree": {"_id": name, "entryNodeId": "n1"}, "nodes": {}}}
        })
    }

    pub fn idm_entity(id: &str) -> Value {
        json!({"_id": id, "properties": {}})
    }
}
