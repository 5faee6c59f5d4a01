//! Promotion options
//!
//! Options come from an optional TOML file and command-line flags. Flags are
//! OR-ed on top of the file: they can enable a setting, never disable one.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Options for one promotion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionOptions {
    /// Compute and report the diff without touching the tenant
    pub what_if: bool,
    /// Actually write variables (and request an environment refresh)
    pub effect_secrets: bool,
    /// Block until an environment refresh completes
    pub wait: bool,
    /// Ask before pruning orphaned journey nodes
    pub prompt_prune: bool,
    /// Never prune orphaned journey nodes
    pub no_prune: bool,
    /// Persist diff and log snapshots
    pub print_diff: bool,
    /// Directory receiving snapshots
    pub snapshot_dir: PathBuf,
    /// Export folder realm name -> runtime realm name; file entries extend
    /// the defaults
    #[serde(deserialize_with = "merge_realm_aliases")]
    pub realm_aliases: BTreeMap<String, String>,
}

impl PromotionOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse options from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid options TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    #[inline]
    #[must_use]
    pub fn with_what_if(mut self, enabled: bool) -> Self {
        self.what_if = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_effect_secrets(mut self, enabled: bool) -> Self {
        self.effect_secrets = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_wait(mut self, enabled: bool) -> Self {
        self.wait = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_prompt_prune(mut self, enabled: bool) -> Self {
        self.prompt_prune = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_no_prune(mut self, enabled: bool) -> Self {
        self.no_prune = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_print_diff(mut self, enabled: bool) -> Self {
        self.print_diff = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Add a realm alias
    #[inline]
    #[must_use]
    pub fn with_realm_alias(mut self, folder: impl Into<String>, realm: impl Into<String>) -> Self {
        self.realm_aliases.insert(folder.into(), realm.into());
        self
    }

    /// Runtime realm name for an export folder name
    #[must_use]
    pub fn runtime_realm<'a>(&'a self, folder: &'a str) -> &'a str {
        self.realm_aliases.get(folder).map_or(folder, String::as_str)
    }
}

impl Default for PromotionOptions {
    fn default() -> Self {
        Self {
            what_if: false,
            effect_secrets: false,
            wait: false,
            prompt_prune: false,
            no_prune: false,
            print_diff: false,
            snapshot_dir: PathBuf::from("."),
            realm_aliases: default_realm_aliases(),
        }
    }
}

fn default_realm_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([("root".to_string(), "/".to_string())])
}

fn merge_realm_aliases<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut aliases = default_realm_aliases();
    aliases.extend(BTreeMap::<String, String>::deserialize(deserializer)?);
    Ok(aliases)
}
