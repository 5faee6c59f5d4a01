//! Tree diffing for environment promotion
//!
//! - [`TreeDiffer`] / [`diff_trees`]: classify artifacts of two export trees
//!   into added / changed / deleted
//! - [`RealmPartition`]: split the result by owning realm
//!
//! # Example
//!
//! ```rust,ignore
//! use envpromo_diff::{diff_trees, RealmPartition};
//!
//! let diff = diff_trees(export_dir, master_dir)?;
//! for (realm, part) in RealmPartition::of(&diff).iter() {
//!     println!("{realm}: +{} ~{} -{}", part.added.len(), part.changed.len(), part.deleted.len());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod diff;
mod error;
mod partition;

pub use diff::{diff_trees, DiffResult, TreeDiffer};
pub use error::DiffError;
pub use partition::{discover_realms, RealmPartition};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
