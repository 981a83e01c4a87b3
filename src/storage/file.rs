//! File-based storage backend for native environments.
//!
//! Every key is persisted as its own JSON file inside a directory, so a single
//! corrupt file never affects the others.

use super::{NoteStorage, StorageError};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
#[cfg(feature = "tracing")]
use tracing::debug;

const STORAGE_FILE_EXTENSION: &str = "json";
const TEMP_FILE_EXTENSION: &str = "json.tmp";

/// File-based storage backend that persists values to JSON files on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Creates a new instance of [`FileStorage`].
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory where the storage files will be stored.
    ///   It is created on the first write.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        let directory = directory.into();
        let directory = if directory.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            directory
        };
        Self { directory }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.directory)?;
        Ok(())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{STORAGE_FILE_EXTENSION}", encode_key(key)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{TEMP_FILE_EXTENSION}", encode_key(key)))
    }
}

fn needs_escape(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '/' | '\\' | '*' | '?' | '"' | '<' | '>' | '|' | '_' | '%' | '.'
        )
}

/// Maps a storage key to a file stem.
///
/// `:` becomes `_`; `_`, `%`, `.` and characters the filesystem rejects are
/// written as `%xx` per UTF-8 byte. [`decode_key`] is the exact inverse.
fn encode_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    let mut buf = [0u8; 4];
    for c in key.chars() {
        if c == ':' {
            stem.push('_');
        } else if needs_escape(c) {
            for byte in c.encode_utf8(&mut buf).bytes() {
                stem.push('%');
                stem.push_str(&hex::encode([byte]));
            }
        } else {
            stem.push(c);
        }
    }
    stem
}

/// Reverses [`encode_key`]. Returns `None` for stems it could not have produced.
fn decode_key(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut key = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                key.push(b':');
                i += 1;
            }
            b'%' => {
                let escaped = bytes.get(i + 1..i + 3)?;
                key.extend(hex::decode(escaped).ok()?);
                i += 3;
            }
            byte => {
                key.push(byte);
                i += 1;
            }
        }
    }
    let key = String::from_utf8(key).ok()?;
    (encode_key(&key) == stem).then_some(key)
}

impl NoteStorage for FileStorage {
    fn keys(&mut self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from(e)),
        };
        let suffix = format!(".{STORAGE_FILE_EXTENSION}");
        let mut keys = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            match name
                .to_str()
                .and_then(|name| name.strip_suffix(&suffix))
                .and_then(decode_key)
            {
                Some(key) => keys.push(key),
                None => {
                    #[cfg(feature = "tracing")]
                    debug!("Ignoring unrelated file {name:?}");
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let bytes = match fs::read(self.file_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::from(e)),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::InvalidData(format!("{key}: {e}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_directory()?;
        let temp_path = self.temp_path(key);
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, self.file_path(key))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.file_path(key)) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from(e)),
        }
    }
}

impl From<FileStorage> for Box<dyn NoteStorage> {
    fn from(storage: FileStorage) -> Self {
        Box::new(storage)
    }
}
