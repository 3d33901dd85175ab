//! Extended-attribute backend.
//!
//! Values live on the file itself, so fingerprints follow the file through
//! renames and copies that preserve attributes (`cp -a`, `rsync -X`).
//! Nothing is cached: every `get` goes to the filesystem.

use std::io;
use std::path::Path;

use super::{AttributeStore, StoreError};

/// Attribute store backed by filesystem extended attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct XattrStore;

impl XattrStore {
    /// Create a new store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether this platform supports extended attributes at all.
    ///
    /// Individual filesystems may still refuse them (vfat, some tmpfs
    /// configurations); those refusals surface as [`StoreError`]s per file.
    #[must_use]
    pub fn is_supported() -> bool {
        ::xattr::SUPPORTED_PLATFORM
    }
}

impl AttributeStore for XattrStore {
    fn get(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if !Self::is_supported() {
            return Err(StoreError::Unsupported(path.to_path_buf()));
        }
        ::xattr::get(path, key).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            key: key.to_string(),
            source,
        })
    }

    fn set(&self, path: &Path, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if !Self::is_supported() {
            return Err(StoreError::Unsupported(path.to_path_buf()));
        }
        ::xattr::set(path, key, value).map_err(|source: io::Error| StoreError::Write {
            path: path.to_path_buf(),
            key: key.to_string(),
            source,
        })
    }
}
