//! Configuration backend seam
//!
//! [`ConfigBackend`] is the contract the promotion engine requires of the
//! configuration-management SDK. Every import is an idempotent upsert and
//! reports success as a `bool`; "already exists" is never an error.
//! Deleting a missing entity is reported, not retried.

use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Import behavior flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Also import entities the artifact depends on
    pub include_dependencies: bool,
    /// Keep node UUIDs from the file instead of generating new ones
    pub reuse_uuids: bool,
    /// Import prerequisites (e.g. policy sets) first
    pub include_prerequisites: bool,
}

impl ImportOptions {
    /// Dependencies on, everything else off
    #[inline]
    #[must_use]
    pub fn with_dependencies() -> Self {
        Self {
            include_dependencies: true,
            ..Self::default()
        }
    }

    /// Keep node UUIDs from the file
    #[inline]
    #[must_use]
    pub fn reusing_uuids(mut self) -> Self {
        self.reuse_uuids = true;
        self
    }
}

/// Agent sub-type, from the entity's `_type._id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Web,
    Gateway,
    Java,
    Generic,
}

impl AgentKind {
    /// Map a declared agent type id
    #[must_use]
    pub fn from_type_id(type_id: &str) -> Self {
        match type_id {
            "WebAgent" => Self::Web,
            "IdentityGatewayAgent" => Self::Gateway,
            "J2EEAgent" => Self::Java,
            _ => Self::Generic,
        }
    }
}

/// Operations the promotion engine performs against a live tenant
///
/// Calls are awaited one at a time; implementations need not handle
/// concurrent use by a single run. Timeouts belong to the implementation's
/// HTTP client.
#[async_trait::async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Switch the realm subsequent calls operate on
    async fn set_realm(&self, realm: &str) -> Result<bool, BackendError>;

    async fn import_oauth2_client(&self, id: &str, file: &Path, options: ImportOptions) -> Result<bool, BackendError>;
    async fn delete_oauth2_client(&self, id: &str) -> Result<bool, BackendError>;

    async fn import_authentication_settings(&self, file: &Path) -> Result<bool, BackendError>;

    async fn import_journey(&self, id: &str, file: &Path, options: ImportOptions) -> Result<bool, BackendError>;
    /// Delete a journey together with its nodes
    async fn delete_journey(&self, id: &str) -> Result<bool, BackendError>;
    async fn find_orphaned_nodes(&self) -> Result<Vec<String>, BackendError>;
    async fn remove_orphaned_nodes(&self, node_ids: &[String]) -> Result<bool, BackendError>;

    async fn import_managed_applications(&self, file: &Path, options: ImportOptions) -> Result<bool, BackendError>;
    async fn delete_managed_application(&self, name: &str) -> Result<bool, BackendError>;

    async fn import_resource_types(&self, file: &Path) -> Result<bool, BackendError>;
    async fn delete_resource_type(&self, name: &str) -> Result<bool, BackendError>;

    async fn import_script(&self, id: &str, name: &str, file: &Path) -> Result<bool, BackendError>;
    async fn delete_script(&self, id: &str, name: &str) -> Result<bool, BackendError>;

    /// Import the first service in `file`; `clean` removes it before re-creating
    async fn import_service(&self, file: &Path, clean: bool, global: bool) -> Result<bool, BackendError>;
    async fn delete_service(&self, id: &str, global: bool) -> Result<bool, BackendError>;

    async fn import_email_template(&self, id: &str, file: &Path) -> Result<bool, BackendError>;

    /// Import the first configuration-store entity in `file`
    async fn import_config_entity(&self, file: &Path) -> Result<bool, BackendError>;
    async fn delete_config_entity(&self, id: &str) -> Result<bool, BackendError>;

    /// Import one mapping, or every mapping in `file` when `id` is `None`
    async fn import_mapping(&self, id: Option<&str>, file: &Path) -> Result<bool, BackendError>;
    async fn delete_mapping(&self, id: &str) -> Result<bool, BackendError>;

    async fn import_variable(&self, id: &str, file: &Path) -> Result<bool, BackendError>;
    async fn delete_variable(&self, id: &str) -> Result<bool, BackendError>;

    async fn import_agent(&self, kind: AgentKind, id: &str, file: &Path) -> Result<bool, BackendError>;
    async fn delete_agent(&self, kind: AgentKind, id: &str) -> Result<bool, BackendError>;

    async fn import_policy(&self, id: &str, file: &Path, options: ImportOptions) -> Result<bool, BackendError>;
    async fn delete_policy(&self, id: &str) -> Result<bool, BackendError>;

    /// Make written variables/secrets take effect; `wait` blocks until done
    async fn apply_environment_updates(&self, wait: bool) -> Result<bool, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_kind_from_type_id() {
        assert_eq!(AgentKind::from_type_id("WebAgent"), AgentKind::Web);
        assert_eq!(AgentKind::from_type_id("IdentityGatewayAgent"), AgentKind::Gateway);
        assert_eq!(AgentKind::from_type_id("J2EEAgent"), AgentKind::Java);
        assert_eq!(AgentKind::from_type_id("SoapSTSAgent"), AgentKind::Generic);
    }

    #[test]
    fn import_options_builders() {
        let options = ImportOptions::with_dependencies().reusing_uuids();
        assert!(options.include_dependencies);
        assert!(options.reuse_uuids);
        assert!(!options.include_prerequisites);
    }
}
