//! Local-first note persistence with debounced autosave.
//!
//! This crate is the storage and session core of a note-taking app: the UI
//! (note list, rich-text editor, buttons) calls into it, it decides what is
//! written where and when.
//!
//! - [`NoteStore`] maps note identifiers to records on top of any
//!   [`NoteStorage`] backend: [`MemoryStorage`], [`FileStorage`] (feature
//!   `file`) or the browser's `localStorage` (feature `wasm-js`).
//! - [`EditSession`] holds the working copy of the open note, writes title
//!   edits immediately and content edits after a quiet period.
//! - [`Autosave`](autosave::Autosave) runs the timer that flushes those edits.
//!
//! ```
//! use noteaway::{EditSession, EditSessionOptions, Instant, MemoryStorage, NoteStore};
//!
//! let mut session = EditSession::new(
//!     NoteStore::new(MemoryStorage::new()),
//!     EditSessionOptions::immediate(),
//! );
//! let id = session.create_note(Instant::now()).unwrap();
//! session.edit_title("Groceries").unwrap();
//!
//! let titles: Vec<_> = session
//!     .store_mut()
//!     .summaries()
//!     .unwrap()
//!     .into_iter()
//!     .map(|summary| summary.title)
//!     .collect();
//! assert_eq!(titles, vec!["Groceries"]);
//! assert_eq!(session.active_id(), Some(&id));
//! ```

pub mod autosave;
pub mod note;
pub mod option;
pub mod session;
pub mod storage;
pub mod store;
mod util;

pub use note::{Note, NoteId, NoteSummary, DEFAULT_TITLE, SEED_CONTENT};
pub use option::EditSessionOptions;
pub use session::{
    ConfirmPrompt, EditSession, SessionError, SessionEvent, SessionState, WorkingCopy,
};
#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub use session::BrowserConfirm;
#[cfg(feature = "file")]
pub use storage::FileStorage;
#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub use storage::LocalStorage;
pub use storage::{MemoryStorage, NoteStorage, StorageError};
pub use store::{NoteError, NoteStore};
pub use util::callback;
pub use wasm_timer::Instant;
