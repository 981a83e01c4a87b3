//! Note records and their stored representation.
//!
//! A [`Note`] is the only persisted entity. On disk (or in `localStorage`) it is
//! encoded as a versioned JSON document so that later layouts can be added
//! without breaking enumeration of older records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title stored for a note whose title is left empty.
pub const DEFAULT_TITLE: &str = "New Note";

/// Markup seeded into a freshly created note.
pub const SEED_CONTENT: &str = "<h1>Hello, World!</h1>\n<p>Cheese</p>";

const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifier of a note, unique within a store and used as its storage key.
#[derive(Serialize, Deserialize, Debug, Hash, Default, PartialEq, Eq, PartialOrd, Ord, Clone)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value of identifiers allocated by the counter.
    pub(crate) fn sequence(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for NoteId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Serialized rich-text markup.
    pub content: String,
    /// Human-readable local time of the last write.
    pub last_modified: String,
}

impl Note {
    /// Builds a note stamped with the current local time.
    ///
    /// An empty `title` is replaced with [`DEFAULT_TITLE`].
    pub(crate) fn stamped(id: NoteId, title: &str, content: &str) -> Self {
        let title = if title.is_empty() {
            DEFAULT_TITLE
        } else {
            title
        };
        Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            last_modified: chrono::Local::now()
                .format(LAST_MODIFIED_FORMAT)
                .to_string(),
        }
    }

    /// The sidebar projection of this note.
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            last_modified: self.last_modified.clone(),
        }
    }

    pub(crate) fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&StoredNote::from(self))
    }

    pub(crate) fn decode(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<StoredNote>(value).map(Note::from)
    }

    /// Decodes `value` only if it is in the unversioned layout.
    pub(crate) fn decode_legacy(value: &str) -> Option<Self> {
        serde_json::from_str::<Legacy>(value)
            .ok()
            .map(|legacy| Note::from(StoredNote::Legacy(legacy)))
    }
}

/// Title and timestamp of a note, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub last_modified: String,
}

/// Every layout a note has been stored in.
///
/// Versioned layouts are tried first; records written before versioning was
/// introduced fall through to [`StoredNote::Legacy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredNote {
    Versioned(VersionedNote),
    Legacy(Legacy),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "version")]
enum VersionedNote {
    #[serde(rename = "1")]
    V1(V1),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1 {
    identifier: NoteId,
    title: String,
    content: String,
    last_modified: String,
}

/// The untagged layout used before records carried a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Legacy {
    filename: NoteId,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    last: String,
}

impl From<&Note> for StoredNote {
    fn from(note: &Note) -> Self {
        StoredNote::Versioned(VersionedNote::V1(V1 {
            identifier: note.id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            last_modified: note.last_modified.clone(),
        }))
    }
}

impl From<StoredNote> for Note {
    fn from(stored: StoredNote) -> Self {
        match stored {
            StoredNote::Versioned(VersionedNote::V1(v1)) => Note {
                id: v1.identifier,
                title: v1.title,
                content: v1.content,
                last_modified: v1.last_modified,
            },
            StoredNote::Legacy(legacy) => Note {
                id: legacy.filename,
                title: legacy.title,
                content: legacy.content,
                last_modified: legacy.last,
            },
        }
    }
}
