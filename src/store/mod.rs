//! Per-path key/value persistence for fingerprints.
//!
//! The core only ever talks to an [`AttributeStore`]: a capability to read
//! and write a named value attached to a file path. Two keys are used per
//! file, one for the content digest and one for the last-verified timestamp
//! (see [`AttributeKeys`]).
//!
//! The two keys are written independently. A digest may be persisted while
//! the timestamp write fails; callers must treat that as a normal state.
//!
//! # Backends
//!
//! - [`XattrStore`]: extended attributes on the file itself (Unix only)
//! - [`MemoryStore`]: in-process map for tests and embedding

pub mod memory;
#[cfg(unix)]
pub mod extended;

use std::path::{Path, PathBuf};

pub use memory::MemoryStore;
#[cfg(unix)]
pub use extended::XattrStore;

use crate::scanner::hasher::HashAlgorithm;

/// Errors raised by an attribute store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Reading an attribute failed.
    #[error("Failed to read attribute {key} of {path}: {source}")]
    Read {
        /// File the attribute belongs to
        path: PathBuf,
        /// Attribute name
        key: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing an attribute failed.
    #[error("Failed to write attribute {key} of {path}: {source}")]
    Write {
        /// File the attribute belongs to
        path: PathBuf,
        /// Attribute name
        key: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The platform or filesystem has no attribute support.
    #[error("Extended attributes are not supported for {0}")]
    Unsupported(PathBuf),
}

/// Key/value persistence indexed by file path.
///
/// Implementations may load lazily or cache in bulk; the core cannot tell.
pub trait AttributeStore {
    /// Read the value of `key` for `path`, or `None` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the value exists but cannot be read.
    fn get(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write `value` under `key` for `path`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the value cannot be persisted.
    fn set(&self, path: &Path, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<S: AttributeStore + ?Sized> AttributeStore for &S {
    fn get(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(path, key)
    }

    fn set(&self, path: &Path, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(path, key, value)
    }
}

/// Names of the two attributes kept per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeKeys {
    /// Attribute holding the hex-encoded digest
    pub digest: String,
    /// Attribute holding the last-verified timestamp
    pub timestamp: String,
}

impl AttributeKeys {
    /// Build the key pair for an algorithm in the given namespace.
    ///
    /// ```
    /// use xattrsum::scanner::HashAlgorithm;
    /// use xattrsum::store::AttributeKeys;
    ///
    /// let keys = AttributeKeys::new("user", HashAlgorithm::Sha1);
    /// assert_eq!(keys.digest, "user.sha1");
    /// assert_eq!(keys.timestamp, "user.sha1date");
    /// ```
    #[must_use]
    pub fn new(namespace: &str, algorithm: HashAlgorithm) -> Self {
        let digest = format!("{}.{}", namespace, algorithm.name());
        let timestamp = format!("{digest}date");
        Self { digest, timestamp }
    }
}

impl Default for AttributeKeys {
    fn default() -> Self {
        Self::new("user", HashAlgorithm::default())
    }
}
