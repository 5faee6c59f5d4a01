//! Exported artifact documents
//!
//! An export file wraps one or more entities in an envelope, e.g.
//! `{ "meta": {...}, "policy": { "<id>": { "_id": "<id>", ... } } }`.
//! Configuration-store entities are bare objects carrying `_id` at the root.
//! [`ArtifactDocument`] locates the primary entity and exposes the id, name
//! and agent sub-type that replay handlers need.

use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};

/// Envelope key carrying export metadata, never an entity
const META_KEY: &str = "meta";

/// Parsed export file
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDocument {
    /// Parsed JSON value
    value: JsonValue,
}

/// Primary entity of a document and the key it was found under
#[derive(Debug, Clone, Copy)]
pub struct Entity<'a> {
    key: Option<&'a str>,
    body: &'a Map<String, JsonValue>,
}

impl<'a> Entity<'a> {
    /// Entity object
    #[inline]
    #[must_use]
    pub fn body(&self) -> &'a Map<String, JsonValue> {
        self.body
    }

    /// `_id` field, else the key the entity was stored under
    #[must_use]
    pub fn id(&self) -> Option<&'a str> {
        self.body
            .get("_id")
            .and_then(JsonValue::as_str)
            .or(self.key)
    }

    /// `name` field, else the id
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.body
            .get("name")
            .and_then(JsonValue::as_str)
            .or_else(|| self.id())
    }

    /// Declared sub-type at `_type._id`
    #[must_use]
    pub fn type_id(&self) -> Option<&'a str> {
        self.body.get("_type")?.get("_id")?.as_str()
    }
}

impl ArtifactDocument {
    /// Create from JSON value
    #[inline]
    #[must_use]
    pub fn new(value: JsonValue) -> Self {
        Self { value }
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let value: JsonValue = serde_json::from_str(json).map_err(DocumentError::InvalidJson)?;
        Ok(Self::new(value))
    }

    /// Read and parse an export file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not JSON
    pub fn read(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Locate the primary entity
    ///
    /// Resolution order: a root object with `_id`; the first non-`meta`
    /// entry if it carries `_id` or `name`; otherwise the first object nested
    /// one level below it (the `{ type: { id: entity } }` envelope).
    ///
    /// # Errors
    /// Returns error if the document holds no object entity
    pub fn entity(&self) -> Result<Entity<'_>, DocumentError> {
        let root = self.value.as_object().ok_or(DocumentError::NotAnObject)?;
        if root.contains_key("_id") {
            return Ok(Entity { key: None, body: root });
        }

        let (key, group) = root
            .iter()
            .filter(|(k, _)| k.as_str() != META_KEY)
            .find_map(|(k, v)| v.as_object().map(|o| (k.as_str(), o)))
            .ok_or(DocumentError::NoEntity)?;

        if group.contains_key("_id") || group.contains_key("name") {
            return Ok(Entity { key: Some(key), body: group });
        }

        Ok(group
            .iter()
            .find_map(|(k, v)| v.as_object().map(|o| Entity { key: Some(k.as_str()), body: o }))
            .unwrap_or(Entity { key: Some(key), body: group }))
    }

    /// Id of the primary entity
    ///
    /// # Errors
    /// Returns error if no entity or id can be found
    pub fn entity_id(&self) -> Result<String, DocumentError> {
        self.entity()?
            .id()
            .map(str::to_string)
            .ok_or(DocumentError::MissingField("_id"))
    }

    /// Name of the primary entity, falling back to its id
    ///
    /// # Errors
    /// Returns error if no entity or name can be found
    pub fn entity_name(&self) -> Result<String, DocumentError> {
        self.entity()?
            .name()
            .map(str::to_string)
            .ok_or(DocumentError::MissingField("name"))
    }
}

/// Errors reading or interpreting an export file
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document root is not an object")]
    NotAnObject,

    #[error("document contains no entity")]
    NoEntity,

    #[error("entity has no {0}")]
    MissingField(&'static str),
}
