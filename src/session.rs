//! The controller for the note currently open in the editor.
//!
//! An [`EditSession`] owns the working copy of one note and decides when it is
//! written back to the [`NoteStore`]. Content edits are buffered and written
//! once the debounce window passes without further edits; title edits and
//! explicit saves write immediately.
//!
//! Time never advances on its own: every operation that schedules work takes
//! the current [`Instant`], and [`EditSession::poll`] performs whatever became
//! due. [`Autosave`](crate::autosave::Autosave) drives `poll` from a timer.
//!
//! # Example
//!
//! ```
//! use noteaway::{EditSession, EditSessionOptions, Instant, MemoryStorage, NoteStore};
//! use std::time::Duration;
//!
//! let mut session = EditSession::new(
//!     NoteStore::new(MemoryStorage::new()),
//!     EditSessionOptions::immediate(),
//! );
//! let now = Instant::now();
//! let id = session.create_note(now).unwrap();
//! session.edit_title("Groceries").unwrap();
//! session.edit_content("<p>milk</p>", now).unwrap();
//! session.poll(now + Duration::from_secs(1));
//!
//! let note = session.store_mut().get(&id).unwrap();
//! assert_eq!(note.title, "Groceries");
//! assert_eq!(note.content, "<p>milk</p>");
//! ```

use crate::{
    note::{Note, NoteId},
    option::EditSessionOptions,
    storage::NoteStorage,
    store::{NoteError, NoteStore},
};
use std::time::Duration;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};
use wasm_timer::Instant;

/// Message shown to the user before a note is deleted.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this note?";

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No note is open.
    Empty,
    /// A note was just created and opens at `ready_at`.
    Loading { id: NoteId, ready_at: Instant },
    /// A note is loaded and editable.
    Open { id: NoteId },
    /// The note was deleted; the session empties at `ready_at`.
    ClosingForDelete { id: NoteId, ready_at: Instant },
}

/// The in-memory, possibly unsaved, state of the open note.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkingCopy {
    pub title: String,
    pub content: String,
}

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A note became active. The editor must replace its document with `content`.
    Opened {
        id: NoteId,
        title: String,
        content: String,
    },
    /// A write reached the store.
    Saved(Note),
    /// A write failed. The working copy is kept and can be saved again.
    SaveFailed { id: NoteId, error: NoteError },
    /// The note was removed from the store.
    Deleted(NoteId),
    /// The session returned to [`SessionState::Empty`].
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No note is open")]
    NoNoteOpen,
    #[error("The note is not editable while it is being created or deleted")]
    NotEditable,
    #[error(transparent)]
    Note(#[from] NoteError),
}

/// Blocking yes/no question asked before destructive actions.
pub trait ConfirmPrompt {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Confirmation prompt backed by `window.confirm`.
#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserConfirm;

#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
impl ConfirmPrompt for BrowserConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        gloo_utils::window()
            .confirm_with_message(message)
            .unwrap_or(false)
    }
}

/// A write waiting for its debounce window, tagged with the note it belongs to.
///
/// `deadline` is `None` once a flush has failed: the edit stays dirty but is
/// only retried by an explicit save or the next edit.
#[derive(Debug, Clone)]
struct PendingEdit {
    id: NoteId,
    title: String,
    content: String,
    deadline: Option<Instant>,
}

/// Controller for the note currently open.
#[derive(Debug)]
pub struct EditSession<S> {
    store: NoteStore<S>,
    options: EditSessionOptions,
    state: SessionState,
    working: Option<WorkingCopy>,
    pending: Option<PendingEdit>,
}

impl<S: NoteStorage> EditSession<S> {
    pub fn new(store: NoteStore<S>, options: EditSessionOptions) -> Self {
        Self {
            store,
            options,
            state: SessionState::Empty,
            working: None,
            pending: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Identifier of the open note, if any.
    pub fn active_id(&self) -> Option<&NoteId> {
        match &self.state {
            SessionState::Open { id } => Some(id),
            _ => None,
        }
    }

    pub fn working_copy(&self) -> Option<&WorkingCopy> {
        self.working.as_ref()
    }

    /// Whether an edit has not reached the store yet.
    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    pub fn store(&self) -> &NoteStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore<S> {
        &mut self.store
    }

    pub fn options(&self) -> &EditSessionOptions {
        &self.options
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let pending = self.pending.as_ref().and_then(|pending| pending.deadline);
        let transition = match &self.state {
            SessionState::Loading { ready_at, .. }
            | SessionState::ClosingForDelete { ready_at, .. } => Some(*ready_at),
            _ => None,
        };
        match (pending, transition) {
            (Some(a), Some(b)) => Some(if a <= b { a } else { b }),
            (a, b) => a.or(b),
        }
    }

    /// Creates a seeded note and schedules opening it.
    ///
    /// A pending edit of the previously open note is written first; if that
    /// fails nothing else happens and the error is returned.
    ///
    /// With a non-zero creation delay the note opens on a later [`poll`](Self::poll);
    /// a running [`Autosave`](crate::autosave::Autosave) must be woken, which
    /// [`Autosave::create_note`](crate::autosave::Autosave::create_note) does.
    pub fn create_note(&mut self, now: Instant) -> Result<NoteId, SessionError> {
        self.flush_pending()?;
        let id = self.store.allocate_id()?;
        let title = self.options.default_title().to_string();
        let content = self.options.seed_content().to_string();
        let note = self.store.upsert(&id, &title, &content)?;
        self.emit(SessionEvent::Saved(note));

        #[cfg(feature = "tracing")]
        debug!("Created note {id}");
        self.working = None;
        self.state = SessionState::Loading {
            id: id.clone(),
            ready_at: now + self.options.creation_delay(),
        };
        if self.options.creation_delay() == Duration::ZERO {
            self.finish_loading();
        }
        Ok(id)
    }

    /// Opens `id`, replacing the working copy with the stored record.
    ///
    /// A pending edit of the previously open note is written to that note
    /// first. If that write fails the switch is aborted so the unsaved edit is
    /// not lost. A missing or unreadable note leaves the session empty.
    pub fn open_note(&mut self, id: &NoteId) -> Result<&WorkingCopy, SessionError> {
        self.flush_pending()?;
        match self.store.get(id) {
            Ok(note) => {
                self.enter_open(note);
                self.working.as_ref().ok_or(SessionError::NoNoteOpen)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                warn!("Could not open note {id}: {err}");
                self.close();
                Err(err.into())
            }
        }
    }

    /// Records a content edit and (re)starts the debounce window.
    pub fn edit_content<T: Into<String>>(
        &mut self,
        content: T,
        now: Instant,
    ) -> Result<(), SessionError> {
        let id = self.editable_id()?;
        let deadline = now + self.options.debounce();
        let working = self.working.get_or_insert_with(WorkingCopy::default);
        let content = content.into();
        if working.content == content && self.pending.is_none() {
            return Ok(());
        }
        working.content = content;
        self.pending = Some(PendingEdit {
            id,
            title: working.title.clone(),
            content: working.content.clone(),
            deadline: Some(deadline),
        });
        Ok(())
    }

    /// Records a title edit and writes it together with the current content.
    pub fn edit_title<T: Into<String>>(&mut self, title: T) -> Result<Note, SessionError> {
        let id = self.editable_id()?;
        self.working.get_or_insert_with(WorkingCopy::default).title = title.into();
        self.write_working(id)
    }

    /// Writes the working copy immediately, skipping the debounce window.
    pub fn save(&mut self) -> Result<Note, SessionError> {
        let id = self.editable_id()?;
        self.write_working(id)
    }

    /// Deletes the open note once `prompt` confirms.
    ///
    /// Returns `Ok(false)` without side effects when the user declines. On
    /// confirmation any pending edit of the note is dropped, so no write can
    /// bring the note back after it is removed.
    pub fn delete_note<P: ConfirmPrompt>(
        &mut self,
        prompt: &mut P,
        now: Instant,
    ) -> Result<bool, SessionError> {
        let id = match &self.state {
            SessionState::Open { id } => id.clone(),
            SessionState::Empty => return Err(SessionError::NoNoteOpen),
            _ => return Err(SessionError::NotEditable),
        };
        if !prompt.confirm(DELETE_PROMPT) {
            return Ok(false);
        }
        self.store.remove(&id)?;

        #[cfg(feature = "tracing")]
        debug!("Deleted note {id}");
        if self.pending.as_ref().is_some_and(|pending| pending.id == id) {
            self.pending = None;
        }
        self.working = None;
        self.state = SessionState::ClosingForDelete {
            id: id.clone(),
            ready_at: now + self.options.closing_delay(),
        };
        self.emit(SessionEvent::Deleted(id));
        if self.options.closing_delay() == Duration::ZERO {
            self.close();
        }
        Ok(true)
    }

    /// Performs everything due at `now`: the debounced write and any delayed
    /// transition. Returns the events produced, which are also delivered to
    /// the `on_event` callback.
    pub fn poll(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        let due = self
            .pending
            .as_ref()
            .and_then(|pending| pending.deadline)
            .is_some_and(|deadline| deadline <= now);
        if due {
            if let Some(event) = self.flush_pending_event() {
                events.push(event);
            }
        }

        let transition_due = match &self.state {
            SessionState::Loading { ready_at, .. }
            | SessionState::ClosingForDelete { ready_at, .. } => *ready_at <= now,
            _ => false,
        };
        if transition_due {
            let event = if matches!(self.state, SessionState::Loading { .. }) {
                self.finish_loading()
            } else {
                self.close()
            };
            events.extend(event);
        }
        events
    }

    fn editable_id(&self) -> Result<NoteId, SessionError> {
        match &self.state {
            SessionState::Open { id } => Ok(id.clone()),
            SessionState::Empty => Err(SessionError::NoNoteOpen),
            _ => Err(SessionError::NotEditable),
        }
    }

    fn stored_title<'a>(&'a self, title: &'a str) -> &'a str {
        if title.is_empty() {
            self.options.default_title()
        } else {
            title
        }
    }

    /// Writes the working copy of `id` and settles the pending edit either way.
    fn write_working(&mut self, id: NoteId) -> Result<Note, SessionError> {
        let working = self.working.clone().unwrap_or_default();
        let title = self.stored_title(&working.title).to_string();
        match self.store.upsert(&id, &title, &working.content) {
            Ok(note) => {
                if self.pending.as_ref().is_some_and(|pending| pending.id == id) {
                    self.pending = None;
                }
                self.emit(SessionEvent::Saved(note.clone()));
                Ok(note)
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                warn!("Could not save note {id}: {error}");
                self.pending = Some(PendingEdit {
                    id: id.clone(),
                    title: working.title,
                    content: working.content,
                    deadline: None,
                });
                self.emit(SessionEvent::SaveFailed {
                    id,
                    error: error.clone(),
                });
                Err(error.into())
            }
        }
    }

    /// Writes the pending edit now, whatever its deadline.
    fn flush_pending(&mut self) -> Result<(), SessionError> {
        match self.flush_pending_event() {
            Some(SessionEvent::SaveFailed { error, .. }) => Err(error.into()),
            _ => Ok(()),
        }
    }

    fn flush_pending_event(&mut self) -> Option<SessionEvent> {
        let pending = self.pending.take()?;
        let title = self.stored_title(&pending.title).to_string();
        let event = match self.store.upsert(&pending.id, &title, &pending.content) {
            Ok(note) => {
                #[cfg(feature = "tracing")]
                debug!("Flushed pending edit of note {}", pending.id);
                SessionEvent::Saved(note)
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                warn!("Could not flush note {}: {error}", pending.id);
                let id = pending.id.clone();
                self.pending = Some(PendingEdit {
                    deadline: None,
                    ..pending
                });
                SessionEvent::SaveFailed { id, error }
            }
        };
        self.emit(event.clone());
        Some(event)
    }

    fn finish_loading(&mut self) -> Option<SessionEvent> {
        let SessionState::Loading { id, .. } = &self.state else {
            return None;
        };
        match self.store.get(id) {
            Ok(note) => Some(self.enter_open(note)),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!("Created note disappeared before opening: {_e}");
                self.close()
            }
        }
    }

    fn enter_open(&mut self, note: Note) -> SessionEvent {
        #[cfg(feature = "tracing")]
        debug!("Opened note {}", note.id);
        self.working = Some(WorkingCopy {
            title: note.title.clone(),
            content: note.content.clone(),
        });
        self.state = SessionState::Open {
            id: note.id.clone(),
        };
        let event = SessionEvent::Opened {
            id: note.id,
            title: note.title,
            content: note.content,
        };
        self.emit(event.clone());
        event
    }

    /// Returns to [`SessionState::Empty`]. Emits [`SessionEvent::Closed`]
    /// unless the session was already empty.
    fn close(&mut self) -> Option<SessionEvent> {
        self.working = None;
        if matches!(self.state, SessionState::Empty) {
            return None;
        }
        self.state = SessionState::Empty;
        self.emit(SessionEvent::Closed);
        Some(SessionEvent::Closed)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(on_event) = &self.options.on_event {
            on_event.call(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        note::{DEFAULT_TITLE, SEED_CONTENT},
        storage::{MemoryStorage, StorageError},
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_millis(200);

    /// Records every note write that reaches the backend.
    #[derive(Debug, Default)]
    struct RecordingStorage {
        inner: MemoryStorage,
        note_writes: Vec<(String, String)>,
    }

    impl NoteStorage for RecordingStorage {
        fn keys(&mut self) -> Result<Vec<String>, StorageError> {
            self.inner.keys()
        }

        fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)?;
            if key.starts_with("note:") {
                self.note_writes.push((key.to_string(), value.to_string()));
            }
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn session() -> EditSession<MemoryStorage> {
        EditSession::new(
            NoteStore::new(MemoryStorage::new()),
            EditSessionOptions::immediate(),
        )
    }

    fn recording_session() -> EditSession<RecordingStorage> {
        EditSession::new(
            NoteStore::new(RecordingStorage::default()),
            EditSessionOptions::immediate(),
        )
    }

    fn yes() -> impl FnMut(&str) -> bool {
        |_: &str| true
    }

    #[test]
    fn test_example_scenario() {
        let mut session = session();
        let t0 = Instant::now();

        let id = session.create_note(t0).unwrap();
        assert_eq!(id, NoteId::from("1"));
        assert_eq!(session.state(), &SessionState::Open { id: id.clone() });
        let created = session.store_mut().get(&id).unwrap();
        assert_eq!(created.title, DEFAULT_TITLE);
        assert_eq!(created.content, SEED_CONTENT);

        let renamed = session.edit_title("Groceries").unwrap();
        assert_eq!(renamed.title, "Groceries");
        assert_eq!(renamed.content, SEED_CONTENT);
        assert_eq!(session.store_mut().get(&id).unwrap().title, "Groceries");

        session.edit_content("<p>milk</p>", t0).unwrap();
        assert_eq!(session.store_mut().get(&id).unwrap().content, SEED_CONTENT);
        session.poll(t0 + WINDOW + Duration::from_millis(1));
        let note = session.store_mut().get(&id).unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "<p>milk</p>");

        assert!(session.delete_note(&mut yes(), t0).unwrap());
        assert_eq!(session.state(), &SessionState::Empty);
        assert!(session.store_mut().list_all().unwrap().is_empty());
    }

    #[test]
    fn test_rapid_edits_coalesce_into_one_write() {
        let mut session = recording_session();
        let t0 = Instant::now();
        let id = session.create_note(t0).unwrap();
        let writes_before = session.store().storage().note_writes.len();

        for i in 0..10u64 {
            let at = t0 + Duration::from_millis(i * 50);
            session.edit_content(format!("<p>{i}</p>"), at).unwrap();
            assert!(session.poll(at).is_empty());
        }
        let last_edit = t0 + Duration::from_millis(450);
        assert_eq!(session.next_deadline(), Some(last_edit + WINDOW));
        session.poll(last_edit + WINDOW);

        let writes = &session.store().storage().note_writes[writes_before..];
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, format!("note:{id}"));
        assert!(writes[0].1.contains("<p>9</p>"));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_delete_suppresses_pending_write() {
        let mut session = session();
        let t0 = Instant::now();
        let id = session.create_note(t0).unwrap();
        session.edit_content("<p>unsaved</p>", t0).unwrap();

        assert!(session.delete_note(&mut yes(), t0).unwrap());
        assert!(!session.is_dirty());
        session.poll(t0 + WINDOW * 2);

        assert_eq!(
            session.store_mut().get(&id),
            Err(NoteError::NotFound(id.clone()))
        );
    }

    #[test]
    fn test_identifiers_are_not_reused_after_delete() {
        let mut session = session();
        let t0 = Instant::now();
        let first = session.create_note(t0).unwrap();
        session.delete_note(&mut yes(), t0).unwrap();
        let second = session.create_note(t0).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_title_edit_writes_latest_content() {
        let mut session = recording_session();
        let t0 = Instant::now();
        let id = session.create_note(t0).unwrap();
        session.edit_content("<p>fresh</p>", t0).unwrap();
        let note = session.edit_title("Plans").unwrap();
        assert_eq!(note.content, "<p>fresh</p>");
        assert!(!session.is_dirty());

        let writes_after_title = session.store().storage().note_writes.len();
        session.poll(t0 + WINDOW * 2);
        assert_eq!(
            session.store().storage().note_writes.len(),
            writes_after_title
        );
        assert_eq!(session.store_mut().get(&id).unwrap().title, "Plans");
    }

    #[test]
    fn test_empty_title_is_stored_as_default() {
        let mut session = session();
        let t0 = Instant::now();
        session.create_note(t0).unwrap();
        let note = session.edit_title("").unwrap();
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(session.working_copy().unwrap().title, "");
    }

    #[test]
    fn test_switching_notes_writes_pending_edit_to_previous_note() {
        let mut session = session();
        let t0 = Instant::now();
        let first = session.create_note(t0).unwrap();
        let second = session.create_note(t0).unwrap();

        session.open_note(&first).unwrap();
        session.edit_content("<p>for first</p>", t0).unwrap();
        let working = session.open_note(&second).unwrap();
        assert_eq!(working.content, SEED_CONTENT);
        assert!(!session.is_dirty());

        session.poll(t0 + WINDOW * 2);
        assert_eq!(
            session.store_mut().get(&first).unwrap().content,
            "<p>for first</p>"
        );
        assert_eq!(session.store_mut().get(&second).unwrap().content, SEED_CONTENT);
    }

    #[test]
    fn test_explicit_save_bypasses_debounce() {
        let mut session = session();
        let t0 = Instant::now();
        let id = session.create_note(t0).unwrap();
        session.edit_content("<p>now</p>", t0).unwrap();
        let saved = session.save().unwrap();
        assert_eq!(saved.content, "<p>now</p>");
        assert_eq!(session.store_mut().get(&id).unwrap().content, "<p>now</p>");
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn test_failed_flush_keeps_working_copy_for_retry() {
        let mut session = session();
        let t0 = Instant::now();
        let id = session.create_note(t0).unwrap();
        session.store_mut().storage_mut().set_quota(Some(0));

        session.edit_content("<p>precious</p>", t0).unwrap();
        let events = session.poll(t0 + WINDOW);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::SaveFailed {
                error: NoteError::StorageUnavailable(StorageError::QuotaExceeded(_)),
                ..
            }]
        ));
        assert!(session.is_dirty());
        assert_eq!(session.next_deadline(), None);
        assert_eq!(session.state(), &SessionState::Open { id: id.clone() });
        assert_eq!(session.working_copy().unwrap().content, "<p>precious</p>");
        assert!(session.save().is_err());

        session.store_mut().storage_mut().set_quota(None);
        session.save().unwrap();
        assert!(!session.is_dirty());
        assert_eq!(
            session.store_mut().get(&id).unwrap().content,
            "<p>precious</p>"
        );
    }

    #[test]
    fn test_failed_flush_blocks_switching_away() {
        let mut session = session();
        let t0 = Instant::now();
        let first = session.create_note(t0).unwrap();
        let second = session.create_note(t0).unwrap();
        session.open_note(&first).unwrap();
        session.edit_content("<p>keep me</p>", t0).unwrap();
        session.store_mut().storage_mut().set_quota(Some(0));

        assert!(session.open_note(&second).is_err());
        assert_eq!(session.active_id(), Some(&first));
        assert_eq!(session.working_copy().unwrap().content, "<p>keep me</p>");
    }

    #[test]
    fn test_declined_delete_has_no_side_effects() {
        let mut session = session();
        let t0 = Instant::now();
        let id = session.create_note(t0).unwrap();
        session.edit_content("<p>draft</p>", t0).unwrap();

        let mut asked = None;
        let mut no = |message: &str| {
            asked = Some(message.to_string());
            false
        };
        assert!(!session.delete_note(&mut no, t0).unwrap());
        assert_eq!(asked.as_deref(), Some(DELETE_PROMPT));
        assert_eq!(session.active_id(), Some(&id));
        assert!(session.is_dirty());
        assert!(session.store_mut().get(&id).is_ok());
    }

    #[test]
    fn test_creation_and_closing_delays_are_honoured() {
        let options = EditSessionOptions::builder()
            .creation_delay(Duration::from_millis(500))
            .closing_delay(Duration::from_millis(500))
            .build();
        let mut session = EditSession::new(NoteStore::new(MemoryStorage::new()), options);
        let t0 = Instant::now();

        let id = session.create_note(t0).unwrap();
        assert!(matches!(session.state(), SessionState::Loading { .. }));
        assert_eq!(
            session.edit_content("<p>too early</p>", t0),
            Err(SessionError::NotEditable)
        );
        assert!(session.poll(t0 + Duration::from_millis(499)).is_empty());

        let events = session.poll(t0 + Duration::from_millis(500));
        assert!(matches!(events.as_slice(), [SessionEvent::Opened { .. }]));
        assert_eq!(session.active_id(), Some(&id));

        let t1 = t0 + Duration::from_secs(1);
        session.delete_note(&mut yes(), t1).unwrap();
        assert!(matches!(
            session.state(),
            SessionState::ClosingForDelete { .. }
        ));
        assert!(session.store_mut().get(&id).is_err());
        assert_eq!(
            session.poll(t1 + Duration::from_millis(500)),
            vec![SessionEvent::Closed]
        );
        assert_eq!(session.state(), &SessionState::Empty);
    }

    #[test]
    fn test_opening_missing_note_leaves_session_empty() {
        let mut session = session();
        let err = session.open_note(&NoteId::from("42")).unwrap_err();
        assert_eq!(err, SessionError::Note(NoteError::NotFound(NoteId::from("42"))));
        assert_eq!(session.state(), &SessionState::Empty);
        assert!(session.working_copy().is_none());
    }

    #[test]
    fn test_externally_cleared_storage_is_tolerated() {
        let mut session = session();
        let t0 = Instant::now();
        let id = session.create_note(t0).unwrap();
        session.store_mut().storage_mut().clear();

        assert!(session.store_mut().list_all().unwrap().is_empty());
        let err = session.open_note(&id).unwrap_err();
        assert!(matches!(err, SessionError::Note(ref e) if e.is_not_found()));
        assert_eq!(session.state(), &SessionState::Empty);
    }

    #[test]
    fn test_edits_require_an_open_note() {
        let mut session = session();
        let t0 = Instant::now();
        assert_eq!(
            session.edit_content("<p>x</p>", t0),
            Err(SessionError::NoNoteOpen)
        );
        assert_eq!(session.edit_title("x"), Err(SessionError::NoNoteOpen));
        assert_eq!(session.save(), Err(SessionError::NoNoteOpen));
        assert_eq!(
            session.delete_note(&mut yes(), t0),
            Err(SessionError::NoNoteOpen)
        );
    }

    #[test]
    fn test_unchanged_content_is_not_scheduled() {
        let mut session = session();
        let t0 = Instant::now();
        session.create_note(t0).unwrap();
        session.edit_content(SEED_CONTENT, t0).unwrap();
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_events_reach_the_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let options = EditSessionOptions::builder()
            .creation_delay(Duration::ZERO)
            .closing_delay(Duration::ZERO)
            .on_event(move |event: &SessionEvent| seen_clone.lock().push(event.clone()))
            .build();
        let mut session = EditSession::new(NoteStore::new(MemoryStorage::new()), options);
        let t0 = Instant::now();

        let id = session.create_note(t0).unwrap();
        session.delete_note(&mut yes(), t0).unwrap();

        let seen = seen.lock();
        assert!(matches!(seen[0], SessionEvent::Saved(ref note) if note.id == id));
        assert!(matches!(seen[1], SessionEvent::Opened { ref content, .. } if content == SEED_CONTENT));
        assert_eq!(seen[2], SessionEvent::Deleted(id));
        assert_eq!(seen[3], SessionEvent::Closed);
        assert_eq!(seen.len(), 4);
    }
}
