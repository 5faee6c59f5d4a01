//! Replay plan backend
//!
//! [`PlanBackend`] answers every call with success and records it as a
//! [`PlannedCall`], in order. The result is an explicit plan of the SDK
//! calls a promotion would make, which can be reviewed or handed to a
//! separate executor.

use crate::backend::{AgentKind, ConfigBackend, ImportOptions};
use crate::error::BackendError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlannedCall {
    SetRealm { realm: String },
    ImportOauth2Client { id: String, file: PathBuf, options: ImportOptions },
    DeleteOauth2Client { id: String },
    ImportAuthenticationSettings { file: PathBuf },
    ImportJourney { id: String, file: PathBuf, options: ImportOptions },
    DeleteJourney { id: String },
    FindOrphanedNodes,
    RemoveOrphanedNodes { node_ids: Vec<String> },
    ImportManagedApplications { file: PathBuf, options: ImportOptions },
    DeleteManagedApplication { name: String },
    ImportResourceTypes { file: PathBuf },
    DeleteResourceType { name: String },
    ImportScript { id: String, name: String, file: PathBuf },
    DeleteScript { id: String, name: String },
    ImportService { file: PathBuf, clean: bool, global: bool },
    DeleteService { id: String, global: bool },
    ImportEmailTemplate { id: String, file: PathBuf },
    ImportConfigEntity { file: PathBuf },
    DeleteConfigEntity { id: String },
    ImportMapping { id: Option<String>, file: PathBuf },
    DeleteMapping { id: String },
    ImportVariable { id: String, file: PathBuf },
    DeleteVariable { id: String },
    ImportAgent { kind: AgentKind, id: String, file: PathBuf },
    DeleteAgent { kind: AgentKind, id: String },
    ImportPolicy { id: String, file: PathBuf, options: ImportOptions },
    DeletePolicy { id: String },
    ApplyEnvironmentUpdates { wait: bool },
}

impl PlannedCall {
    /// Whether this call changes tenant state
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::SetRealm { .. } | Self::FindOrphanedNodes)
    }
}

/// Backend that records calls instead of performing them
#[derive(Debug, Default)]
pub struct PlanBackend {
    calls: Mutex<Vec<PlannedCall>>,
    orphaned_nodes: Vec<String>,
    absent: HashSet<String>,
    failing: Vec<PlannedCall>,
}

impl PlanBackend {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these node ids from `find_orphaned_nodes`
    #[must_use]
    pub fn with_orphaned_nodes(mut self, node_ids: Vec<String>) -> Self {
        self.orphaned_nodes = node_ids;
        self
    }

    /// Report deletes of these ids as unsuccessful, as for entities
    /// missing from the tenant
    #[must_use]
    pub fn with_absent<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.absent.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Fail calls equal to any of `calls` with a request error, as for an
    /// unreachable tenant; the call is still recorded
    #[must_use]
    pub fn with_failing(mut self, calls: impl IntoIterator<Item = PlannedCall>) -> Self {
        self.failing.extend(calls);
        self
    }

    /// Calls recorded so far
    #[must_use]
    pub fn calls(&self) -> Vec<PlannedCall> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls that change tenant state
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_mutation()).count()
    }

    /// Write the plan as pretty JSON
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn write_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(&*self.calls.lock())?;
        std::fs::write(path, json)
    }

    fn record(&self, call: PlannedCall) -> Result<bool, BackendError> {
        tracing::debug!(?call, "planned");
        let fails = self.failing.contains(&call);
        self.calls.lock().push(call);
        if fails {
            return Err(BackendError::Request("planned failure".into()));
        }
        Ok(true)
    }

    fn record_delete(&self, id: &str, call: PlannedCall) -> Result<bool, BackendError> {
        self.record(call)?;
        Ok(!self.absent.contains(id))
    }
}

#[async_trait::async_trait]
impl ConfigBackend for PlanBackend {
    async fn set_realm(&self, realm: &str) -> Result<bool, BackendError> {
        self.record(PlannedCall::SetRealm { realm: realm.to_string() })
    }

    async fn import_oauth2_client(&self, id: &str, file: &Path, options: ImportOptions) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportOauth2Client { id: id.to_string(), file: file.to_path_buf(), options })
    }

    async fn delete_oauth2_client(&self, id: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteOauth2Client { id: id.to_string() })
    }

    async fn import_authentication_settings(&self, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportAuthenticationSettings { file: file.to_path_buf() })
    }

    async fn import_journey(&self, id: &str, file: &Path, options: ImportOptions) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportJourney { id: id.to_string(), file: file.to_path_buf(), options })
    }

    async fn delete_journey(&self, id: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteJourney { id: id.to_string() })
    }

    async fn find_orphaned_nodes(&self) -> Result<Vec<String>, BackendError> {
        self.record(PlannedCall::FindOrphanedNodes)?;
        Ok(self.orphaned_nodes.clone())
    }

    async fn remove_orphaned_nodes(&self, node_ids: &[String]) -> Result<bool, BackendError> {
        self.record(PlannedCall::RemoveOrphanedNodes { node_ids: node_ids.to_vec() })
    }

    async fn import_managed_applications(&self, file: &Path, options: ImportOptions) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportManagedApplications { file: file.to_path_buf(), options })
    }

    async fn delete_managed_application(&self, name: &str) -> Result<bool, BackendError> {
        self.record_delete(name, PlannedCall::DeleteManagedApplication { name: name.to_string() })
    }

    async fn import_resource_types(&self, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportResourceTypes { file: file.to_path_buf() })
    }

    async fn delete_resource_type(&self, name: &str) -> Result<bool, BackendError> {
        self.record_delete(name, PlannedCall::DeleteResourceType { name: name.to_string() })
    }

    async fn import_script(&self, id: &str, name: &str, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportScript { id: id.to_string(), name: name.to_string(), file: file.to_path_buf() })
    }

    async fn delete_script(&self, id: &str, name: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteScript { id: id.to_string(), name: name.to_string() })
    }

    async fn import_service(&self, file: &Path, clean: bool, global: bool) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportService { file: file.to_path_buf(), clean, global })
    }

    async fn delete_service(&self, id: &str, global: bool) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteService { id: id.to_string(), global })
    }

    async fn import_email_template(&self, id: &str, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportEmailTemplate { id: id.to_string(), file: file.to_path_buf() })
    }

    async fn import_config_entity(&self, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportConfigEntity { file: file.to_path_buf() })
    }

    async fn delete_config_entity(&self, id: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteConfigEntity { id: id.to_string() })
    }

    async fn import_mapping(&self, id: Option<&str>, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportMapping { id: id.map(str::to_string), file: file.to_path_buf() })
    }

    async fn delete_mapping(&self, id: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteMapping { id: id.to_string() })
    }

    async fn import_variable(&self, id: &str, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportVariable { id: id.to_string(), file: file.to_path_buf() })
    }

    async fn delete_variable(&self, id: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteVariable { id: id.to_string() })
    }

    async fn import_agent(&self, kind: AgentKind, id: &str, file: &Path) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportAgent { kind, id: id.to_string(), file: file.to_path_buf() })
    }

    async fn delete_agent(&self, kind: AgentKind, id: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeleteAgent { kind, id: id.to_string() })
    }

    async fn import_policy(&self, id: &str, file: &Path, options: ImportOptions) -> Result<bool, BackendError> {
        self.record(PlannedCall::ImportPolicy { id: id.to_string(), file: file.to_path_buf(), options })
    }

    async fn delete_policy(&self, id: &str) -> Result<bool, BackendError> {
        self.record_delete(id, PlannedCall::DeletePolicy { id: id.to_string() })
    }

    async fn apply_environment_updates(&self, wait: bool) -> Result<bool, BackendError> {
        self.record(PlannedCall::ApplyEnvironmentUpdates { wait })
    }
}
