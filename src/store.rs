//! CRUD over note records on top of a [`NoteStorage`] backend.

use crate::{
    note::{Note, NoteId, NoteSummary},
    storage::{NoteStorage, StorageError},
};
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

const NOTE_KEY_PREFIX: &str = "note:";
const NEXT_ID_KEY: &str = "meta:next-id";

/// Errors returned by [`NoteStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("Note {0} not found")]
    NotFound(NoteId),
    #[error("Note {id} is malformed: {reason}")]
    MalformedRecord { id: NoteId, reason: String },
    #[error("No note identifiers left to allocate")]
    IdsExhausted,
    #[error(transparent)]
    StorageUnavailable(#[from] StorageError),
}

impl NoteError {
    /// Whether the note simply cannot be shown, as opposed to the store failing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NoteError::NotFound(_) | NoteError::MalformedRecord { .. }
        )
    }
}

/// Keyed note persistence.
///
/// The store holds no cache: every call goes to the backend, so notes removed
/// or cleared behind its back simply stop showing up.
#[derive(Debug, Default)]
pub struct NoteStore<S> {
    storage: S,
}

impl<S: NoteStorage> NoteStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Returns every readable note in the backend's enumeration order.
    ///
    /// Records that fail to decode are skipped.
    pub fn list_all(&mut self) -> Result<Vec<Note>, NoteError> {
        let mut notes = Vec::new();
        for key in self.storage.keys()? {
            let Some(id) = key.strip_prefix(NOTE_KEY_PREFIX) else {
                continue;
            };
            match self.get(&NoteId::from(id)) {
                Ok(note) => notes.push(note),
                Err(NoteError::StorageUnavailable(err)) => return Err(err.into()),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    warn!("Skipping note {id}: {_e}");
                }
            }
        }
        Ok(notes)
    }

    /// Summaries of [`list_all`](Self::list_all), for rendering a note list.
    pub fn summaries(&mut self) -> Result<Vec<NoteSummary>, NoteError> {
        Ok(self.list_all()?.iter().map(Note::summary).collect())
    }

    pub fn get(&mut self, id: &NoteId) -> Result<Note, NoteError> {
        let value = match self.storage.get(&note_key(id)) {
            Ok(Some(value)) => value,
            Ok(None) => return Err(NoteError::NotFound(id.clone())),
            Err(StorageError::InvalidData(reason)) => {
                return Err(NoteError::MalformedRecord {
                    id: id.clone(),
                    reason,
                })
            }
            Err(e) => return Err(e.into()),
        };
        let note = Note::decode(&value).map_err(|e| NoteError::MalformedRecord {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        if note.id != *id {
            return Err(NoteError::MalformedRecord {
                id: id.clone(),
                reason: format!("record claims identifier {}", note.id),
            });
        }
        Ok(note)
    }

    /// Writes the full record for `id`, replacing any previous one.
    pub fn upsert(&mut self, id: &NoteId, title: &str, content: &str) -> Result<Note, NoteError> {
        let note = Note::stamped(id.clone(), title, content);
        self.write(&note)?;
        Ok(note)
    }

    fn write(&mut self, note: &Note) -> Result<(), NoteError> {
        let value = note.encode().map_err(|e| NoteError::MalformedRecord {
            id: note.id.clone(),
            reason: e.to_string(),
        })?;
        self.storage.set(&note_key(&note.id), &value)?;
        #[cfg(feature = "tracing")]
        debug!("Wrote note {} ({} bytes)", note.id, value.len());
        Ok(())
    }

    fn is_occupied(&mut self, id: &NoteId) -> Result<bool, NoteError> {
        match self.storage.get(&note_key(id)) {
            Ok(value) => Ok(value.is_some()),
            Err(StorageError::InvalidData(_)) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Moves records written before keys were namespaced into this store.
    ///
    /// Every value in `legacy` holding an unversioned record
    /// (`{"title", "content", "last", "filename"}`) is rewritten as a versioned
    /// record under its `filename` and then removed from `legacy`. Other values
    /// are left untouched. A record whose identifier is already taken gets a
    /// freshly allocated one. Returns the identifiers of the imported notes.
    ///
    /// In the browser, pass a `LocalStorage` created with an empty prefix to reach the bare keys an older version
    /// of the app wrote.
    pub fn migrate_legacy<L: NoteStorage>(
        &mut self,
        legacy: &mut L,
    ) -> Result<Vec<NoteId>, NoteError> {
        let mut imported = Vec::new();
        for key in legacy.keys()? {
            let value = match legacy.get(&key) {
                Ok(Some(value)) => value,
                Ok(None) | Err(StorageError::InvalidData(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            let Some(mut note) = Note::decode_legacy(&value) else {
                continue;
            };
            if note.id.as_str().is_empty() {
                note.id = NoteId::from(key.as_str());
            }
            if self.is_occupied(&note.id)? {
                note.id = self.allocate_id()?;
            }
            self.write(&note)?;
            legacy.remove(&key)?;
            #[cfg(feature = "tracing")]
            debug!("Imported legacy record {key} as note {}", note.id);
            imported.push(note.id);
        }
        Ok(imported)
    }

    /// Deletes the record for `id`. Deleting a missing note succeeds.
    pub fn remove(&mut self, id: &NoteId) -> Result<(), NoteError> {
        self.storage.remove(&note_key(id))?;
        #[cfg(feature = "tracing")]
        debug!("Removed note {id}");
        Ok(())
    }

    /// Allocates an identifier no note has used before.
    ///
    /// The counter is persisted, so identifiers of deleted notes are never
    /// handed out again. It is also bumped past every numeric identifier
    /// present, which covers records written before the counter existed.
    /// An identifier of `u64::MAX` has no successor and is not counted.
    pub fn allocate_id(&mut self) -> Result<NoteId, NoteError> {
        let counter = self
            .storage
            .get(NEXT_ID_KEY)?
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(1);
        let past_existing = self
            .storage
            .keys()?
            .iter()
            .filter_map(|key| key.strip_prefix(NOTE_KEY_PREFIX))
            .filter_map(|id| NoteId::from(id).sequence()?.checked_add(1))
            .max()
            .unwrap_or(1);
        let next = counter.max(past_existing);
        let after = next.checked_add(1).ok_or(NoteError::IdsExhausted)?;
        self.storage.set(NEXT_ID_KEY, &after.to_string())?;
        Ok(NoteId::from(next))
    }
}

fn note_key(id: &NoteId) -> String {
    format!("{NOTE_KEY_PREFIX}{id}")
}
