//! Browser `localStorage` backend.

use super::{NoteStorage, StorageError};
use wasm_bindgen::JsValue;
use web_sys::Storage;
#[cfg(feature = "tracing")]
use tracing::error;

const LOCAL_STORAGE_PREFIX: &str = "noteaway:";

impl From<JsValue> for StorageError {
    fn from(err: JsValue) -> Self {
        StorageError::WebSys(format!("{err:?}"))
    }
}

/// Implementation of [`NoteStorage`] on top of `window.localStorage`.
///
/// Every key is namespaced with a prefix so that notes can share the origin's
/// storage with other data.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    prefix: String,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorage {
    /// Creates a new instance of [`LocalStorage`] using the default prefix.
    pub fn new() -> Self {
        Self::with_prefix(LOCAL_STORAGE_PREFIX)
    }

    /// Creates a new instance of [`LocalStorage`] namespacing keys with `prefix`.
    pub fn with_prefix<T: Into<String>>(prefix: T) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn get_local_storage(&self) -> Result<Storage, StorageError> {
        match gloo_utils::window().local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(StorageError::Unavailable(
                "LocalStorage not available".to_string(),
            )),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!("Could not find local storage: {_e:?}");
                Err(StorageError::Unavailable(
                    "LocalStorage access denied".to_string(),
                ))
            }
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl NoteStorage for LocalStorage {
    fn keys(&mut self) -> Result<Vec<String>, StorageError> {
        let local_storage = self.get_local_storage()?;
        let len = local_storage.length()?;
        let mut keys = Vec::new();
        for i in 0..len {
            if let Some(key) = local_storage.key(i)? {
                if let Some(key) = key.strip_prefix(&self.prefix) {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let local_storage = self.get_local_storage()?;
        Ok(local_storage.get_item(&self.key(key))?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let local_storage = self.get_local_storage()?;
        local_storage
            .set_item(&self.key(key), value)
            .map_err(|_e| {
                #[cfg(feature = "tracing")]
                error!("Could not set item in local storage: {_e:?}");
                StorageError::QuotaExceeded(format!("could not write {key}"))
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let local_storage = self.get_local_storage()?;
        local_storage.remove_item(&self.key(key))?;
        Ok(())
    }
}

impl From<LocalStorage> for Box<dyn NoteStorage> {
    fn from(storage: LocalStorage) -> Self {
        Box::new(storage)
    }
}
