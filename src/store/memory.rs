//! In-process attribute store.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{AttributeStore, StoreError};

/// Attribute store kept in memory.
///
/// Nothing is persisted. Writes to selected keys can be made to fail,
/// which models a store that persisted the digest but lost the timestamp.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<(PathBuf, String), Vec<u8>>>,
    failing_keys: Mutex<HashSet<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `key` fail.
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string());
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttributeStore for MemoryStore {
    fn get(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(&(path.to_path_buf(), key.to_string())).cloned())
    }

    fn set(&self, path: &Path, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let failing = self
            .failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key);
        if failing {
            return Err(StoreError::Write {
                path: path.to_path_buf(),
                key: key.to_string(),
                source: io::Error::other("injected write failure"),
            });
        }

        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((path.to_path_buf(), key.to_string()), value.to_vec());
        Ok(())
    }
}
