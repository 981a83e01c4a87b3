//! Durable key-value backends for note records.
//!
//! [`NoteStore`](crate::store::NoteStore) only ever talks to a [`NoteStorage`],
//! so the same store logic runs against the browser's `localStorage`, a
//! directory of JSON files or an in-memory map.

pub mod memory;

#[cfg(feature = "file")]
pub mod file;
#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub mod wasm_js;

#[cfg(feature = "file")]
pub use file::FileStorage;
pub use memory::MemoryStorage;
#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub use wasm_js::LocalStorage;

/// Errors raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("File error: {0}")]
    File(String),
    #[error("WebSys error: {0}")]
    WebSys(String),
    /// The value under a key exists but is not text.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::File(err.to_string())
    }
}

/// Trait for persisting note records as string values under string keys.
///
/// A single `set` must be atomic: readers either see the previous value or the
/// new one, never a partial write.
pub trait NoteStorage {
    /// Lists every key currently held, in the backend's enumeration order.
    fn keys(&mut self) -> Result<Vec<String>, StorageError>;

    /// Retrieves a stored value by key.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the key exists in storage
    /// * `Ok(None)` if the key does not exist
    /// * `Err(StorageError)` if the backend could not be read
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores a value under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a stored value. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: NoteStorage + ?Sized> NoteStorage for Box<S> {
    fn keys(&mut self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<S: NoteStorage + ?Sized> NoteStorage for &mut S {
    fn keys(&mut self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_storage_forwards_calls() {
        let mut storage: Box<dyn NoteStorage> = MemoryStorage::new().into();
        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.keys().unwrap(), vec!["a".to_string()]);
        storage.remove("a").unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
    }

    #[test]
    fn test_io_errors_map_to_file_errors() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(StorageError::from(err), StorageError::File(_)));
    }
}
