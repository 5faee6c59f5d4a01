//! Artifact type enumeration
//!
//! Every exported artifact is typed by the directory it lives in. The type
//! decides promotability, which volatile fields are ignored when comparing,
//! and which handler replays it.

use std::fmt::{self, Display, Formatter};

/// Closed set of artifact types known to the promotion engine
///
/// Directory names that match none of the known types are preserved in
/// [`ArtifactType::Other`] so replay can report them instead of losing them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ArtifactType {
    /// OAuth2 client
    Application,
    Authentication,
    Journey,
    ManagedApplication,
    ResourceType,
    Script,
    Service,
    Theme,
    EmailTemplate,
    /// Configuration-store entity (any depth below an `idm` directory)
    Idm,
    Secret,
    Sync,
    Mapping,
    Variable,
    Agent,
    Idp,
    Saml,
    /// Circle of trust
    Cot,
    PolicySet,
    Policy,
    /// Unrecognized directory name
    Other(String),
}

impl ArtifactType {
    /// Every named variant, in declaration order
    pub const KNOWN: [ArtifactType; 20] = [
        Self::Application,
        Self::Authentication,
        Self::Journey,
        Self::ManagedApplication,
        Self::ResourceType,
        Self::Script,
        Self::Service,
        Self::Theme,
        Self::EmailTemplate,
        Self::Idm,
        Self::Secret,
        Self::Sync,
        Self::Mapping,
        Self::Variable,
        Self::Agent,
        Self::Idp,
        Self::Saml,
        Self::Cot,
        Self::PolicySet,
        Self::Policy,
    ];

    /// Resolve a directory segment to its artifact type
    #[must_use]
    pub fn from_segment(segment: &str) -> Self {
        match segment {
            "application" => Self::Application,
            "authentication" => Self::Authentication,
            "journey" => Self::Journey,
            "managedApplication" => Self::ManagedApplication,
            "resourcetype" => Self::ResourceType,
            "script" => Self::Script,
            "service" => Self::Service,
            "theme" => Self::Theme,
            "emailTemplate" => Self::EmailTemplate,
            "idm" => Self::Idm,
            "secret" => Self::Secret,
            "sync" => Self::Sync,
            "mapping" => Self::Mapping,
            "variable" => Self::Variable,
            "agent" => Self::Agent,
            "idp" => Self::Idp,
            "saml" => Self::Saml,
            "cot" => Self::Cot,
            "policyset" => Self::PolicySet,
            "policy" => Self::Policy,
            other => Self::Other(other.to_string()),
        }
    }

    /// Directory segment for this type
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Application => "application",
            Self::Authentication => "authentication",
            Self::Journey => "journey",
            Self::ManagedApplication => "managedApplication",
            Self::ResourceType => "resourcetype",
            Self::Script => "script",
            Self::Service => "service",
            Self::Theme => "theme",
            Self::EmailTemplate => "emailTemplate",
            Self::Idm => "idm",
            Self::Secret => "secret",
            Self::Sync => "sync",
            Self::Mapping => "mapping",
            Self::Variable => "variable",
            Self::Agent => "agent",
            Self::Idp => "idp",
            Self::Saml => "saml",
            Self::Cot => "cot",
            Self::PolicySet => "policyset",
            Self::Policy => "policy",
            Self::Other(s) => s,
        }
    }

    /// Whether artifacts of this type take part in promotion at all
    ///
    /// Circles of trust, policy sets and SAML entities are managed out of band.
    #[inline]
    #[must_use]
    pub fn is_promotable(&self) -> bool {
        !matches!(self, Self::Cot | Self::PolicySet | Self::Saml)
    }

    /// Whether this is a recognized type
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Display for ArtifactType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ArtifactType {
    fn from(s: String) -> Self {
        Self::from_segment(&s)
    }
}

impl From<ArtifactType> for String {
    fn from(t: ArtifactType) -> Self {
        t.as_str().to_string()
    }
}
