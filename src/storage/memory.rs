//! In-process storage backend.

use super::{NoteStorage, StorageError};
use std::collections::BTreeMap;

/// Ordered in-memory map, optionally bounded by a byte quota.
///
/// Nothing survives the process, which makes it the backend of choice for
/// tests and for hosts that persist notes some other way.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Creates an empty, unbounded [`MemoryStorage`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty [`MemoryStorage`] holding at most `bytes` of keys and
    /// values combined, the way browsers cap `localStorage`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(bytes),
        }
    }

    /// Replaces the quota. `None` removes the bound.
    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Total size of keys and values currently held.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry, as a user clearing site data would.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl NoteStorage for MemoryStorage {
    fn keys(&mut self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let replaced = self
                .entries
                .get(key)
                .map(|previous| key.len() + previous.len())
                .unwrap_or(0);
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded(format!(
                    "{needed} bytes needed, quota is {quota}"
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

impl From<MemoryStorage> for Box<dyn NoteStorage> {
    fn from(storage: MemoryStorage) -> Self {
        Box::new(storage)
    }
}
