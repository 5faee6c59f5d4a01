//! Exported configuration artifacts
//!
//! The leaf layer of the promotion engine: everything that can be said about
//! a single artifact file without looking at a second tree or a live tenant.
//!
//! # Core Concepts
//!
//! - [`ContentHash`]: SHA-256 digest used as a fast equality check
//! - [`ArtifactType`]: closed set of artifact types, with promotability
//! - [`ArtifactPath`]: tree-relative path, classified into type and [`Scope`]
//! - [`VolatileFilter`] / [`equivalent`]: type-aware comparison that ignores
//!   bookkeeping fields
//! - [`ArtifactDocument`]: entity id / name / sub-type extraction
//!
//! # Example
//!
//! ```rust
//! use envpromo_artifact::{ArtifactPath, ArtifactType, Scope};
//!
//! let path = ArtifactPath::new("realm/alpha/policy/p1.policy.authz.json");
//! let c = path.classify();
//! assert_eq!(c.artifact_type, ArtifactType::Policy);
//! assert_eq!(c.scope, Scope::Realm("alpha".into()));
//! assert!(c.promotable);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact_type;
mod document;
mod equivalence;
mod hash;
mod path;

pub use artifact_type::ArtifactType;
pub use document::{ArtifactDocument, DocumentError, Entity};
pub use equivalence::{equivalent, equivalent_values, VolatileFilter};
pub use hash::{ContentHash, HashError};
pub use path::{ArtifactPath, Classification, Scope, GLOBAL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
