//! Export-tree relative paths
//!
//! Provides [`ArtifactPath`], a slash-separated path rooted at the export
//! tree root, and the classification of a path into artifact type and
//! owning [`Scope`].
//!
//! Layout: `global/<type>/<file>`, `realm/<realm>/<type>/<file>`, or
//! `global/idm/...` (arbitrarily nested) for configuration-store entities.

use crate::artifact_type::ArtifactType;
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path};

/// Realm segment prefix
const REALM_ROOT: &str = "realm";

/// Name of the global pseudo-realm
pub const GLOBAL: &str = "global";

/// Relative path of an artifact inside an export tree
///
/// Always uses `/` as separator regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    /// Create from a slash-separated string
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Create from a filesystem path relative to the tree root
    ///
    /// Returns `None` if any segment is not valid UTF-8, since such a path
    /// could not be joined back onto another tree root.
    #[must_use]
    pub fn from_relative(path: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            if let Component::Normal(s) = component {
                segments.push(s.to_str()?);
            }
        }
        Some(Self(segments.join("/")))
    }

    /// Get the path as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterator over path segments
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// File extension of the last segment (without the dot)
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.').map(|i| &name[i + 1..])
    }

    /// Check whether a segment equals `segment` exactly
    #[inline]
    #[must_use]
    pub fn has_segment(&self, segment: &str) -> bool {
        self.segments().any(|s| s == segment)
    }

    /// Version-control and documentation files never take part in a diff
    #[must_use]
    pub fn is_housekeeping(&self) -> bool {
        self.has_segment(".git") || self.0.contains("README.md")
    }

    /// Whether this is the aggregate `sync.json` mapping file
    #[inline]
    #[must_use]
    pub fn is_sync_aggregate(&self) -> bool {
        self.file_name() == "sync.json"
    }

    /// Whether this path denotes an email template
    #[inline]
    #[must_use]
    pub fn is_email_template(&self) -> bool {
        self.0.contains("emailTemplate")
    }

    /// Raw script bodies are re-imported through their owning config file
    #[inline]
    #[must_use]
    pub fn is_script_body(&self) -> bool {
        matches!(self.extension(), Some("js" | "groovy"))
    }

    /// Artifact type derived from the path
    ///
    /// Any `idm` segment wins; otherwise the parent directory names the type.
    #[must_use]
    pub fn artifact_type(&self) -> ArtifactType {
        if self.has_segment("idm") {
            return ArtifactType::Idm;
        }
        let segments: Vec<_> = self.segments().collect();
        match segments.len() {
            0 | 1 => ArtifactType::Other(String::new()),
            n => ArtifactType::from_segment(segments[n - 2]),
        }
    }

    /// Owning scope: the realm named after `realm/`, or global
    #[must_use]
    pub fn scope(&self) -> Scope {
        let mut segments = self.segments();
        match (segments.next(), segments.next()) {
            (Some(REALM_ROOT), Some(name)) => Scope::Realm(name.to_string()),
            _ => Scope::Global,
        }
    }

    /// Classify type, scope and promotability in one pass
    #[must_use]
    pub fn classify(&self) -> Classification {
        let artifact_type = self.artifact_type();
        Classification {
            promotable: artifact_type.is_promotable(),
            scope: self.scope(),
            artifact_type,
        }
    }
}

impl Display for ArtifactPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for ArtifactPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Owning realm of an artifact, or the global pseudo-realm
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Scope {
    /// Tenant-wide configuration
    Global,
    /// A named realm as it appears in the export tree
    Realm(String),
}

impl Scope {
    /// Scope key as used in logs and partitions
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Global => GLOBAL,
            Self::Realm(name) => name,
        }
    }

    /// Realm name, if this is a realm scope
    #[inline]
    #[must_use]
    pub fn realm(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Realm(name) => Some(name),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        if s == GLOBAL {
            Self::Global
        } else {
            Self::Realm(s)
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.name().to_string()
    }
}

/// Result of classifying an [`ArtifactPath`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub artifact_type: ArtifactType,
    pub scope: Scope,
    pub promotable: bool,
}
