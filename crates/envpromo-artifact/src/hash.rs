//! Content hashing for exported artifact files
//!
//! Provides [`ContentHash`], a strongly-typed SHA-256 digest used as the
//! fast-path equality check between corresponding files of two export trees.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A 32-byte content hash (SHA-256)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Compute SHA-256 of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::new(Sha256::digest(data).into())
    }

    /// Hash the full content of a file
    ///
    /// # Errors
    /// Returns [`HashError::Io`] if the file cannot be read
    pub fn of_file(path: impl AsRef<Path>) -> Result<Self, HashError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::compute(&bytes))
    }
}

/// Errors that can occur when hashing artifact content
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_sha256() {
        // sha256("abc")
        let expected = ContentHash::new([
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea,
            0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23,
            0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c,
            0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
        ]);
        assert_eq!(ContentHash::compute(b"abc"), expected);
    }

    #[test]
    fn content_hash_compute_different_data() {
        let h1 = ContentHash::compute(b"data1");
        let h2 = ContentHash::compute(b"data2");
        assert_ne!(h1, h2);
    }

    #[test]
    fn content_hash_of_file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        std::fs::write(&path, b"{\"a\":1}").unwrap();

        let hash = ContentHash::of_file(&path).unwrap();
        assert_eq!(hash, ContentHash::compute(b"{\"a\":1}"));
    }

    #[test]
    fn content_hash_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = ContentHash::of_file(dir.path().join("missing.json"));
        assert!(matches!(result, Err(HashError::Io { .. })));
    }
}
