//! Timer-driven flushing for an [`EditSession`].
//!
//! [`Autosave`] spawns a local task that sleeps until the session's next
//! deadline and then calls [`EditSession::poll`]. The host calls
//! [`Autosave::wake`] after every edit so the task picks up the new deadline;
//! a debounce window that is restarted by a later edit simply moves the
//! deadline and the task goes back to sleep.
//!
//! On native targets the task runs on the current `tokio` [`LocalSet`](tokio::task::LocalSet),
//! in the browser on the JavaScript event loop.

use crate::{
    note::NoteId,
    session::{ConfirmPrompt, EditSession, SessionError},
    storage::NoteStorage,
    util::sleep::sleep_until,
};
use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    future::FutureExt,
    pin_mut, select, StreamExt,
};
use std::{cell::RefCell, fmt, rc::Rc};
#[cfg(not(target_family = "wasm"))]
use tokio::task::spawn_local;
#[cfg(feature = "tracing")]
use tracing::debug;
#[cfg(target_family = "wasm")]
use wasm_bindgen_futures::spawn_local;
use wasm_timer::Instant;

/// An [`EditSession`] shared between the UI and the autosave task.
pub type SharedSession<S> = Rc<RefCell<EditSession<S>>>;

enum Wake {
    Deadline,
    Notified,
    Closed,
}

struct AutosaveHandler<S> {
    session: SharedSession<S>,
    receiver: UnboundedReceiver<()>,
}

impl<S: NoteStorage + 'static> AutosaveHandler<S> {
    async fn run(&mut self) {
        loop {
            // The borrow ends before awaiting, so the UI can keep editing.
            let deadline = self.session.borrow().next_deadline();
            let wake = match deadline {
                Some(deadline) => {
                    let timer = sleep_until(deadline).fuse();
                    let message = self.receiver.next().fuse();
                    pin_mut!(timer, message);
                    select! {
                        _ = timer => Wake::Deadline,
                        message = message => match message {
                            Some(()) => Wake::Notified,
                            None => Wake::Closed,
                        },
                    }
                }
                None => match self.receiver.next().await {
                    Some(()) => Wake::Notified,
                    None => Wake::Closed,
                },
            };

            match wake {
                Wake::Deadline => {
                    let _events = self.session.borrow_mut().poll(Instant::now());
                    #[cfg(feature = "tracing")]
                    debug!("Autosave poll produced {} event(s)", _events.len());
                }
                Wake::Notified => continue,
                Wake::Closed => break,
            }
        }
    }
}

/// Handle to a running autosave task. Dropping it stops the task; a pending
/// edit that has not reached its deadline stays in the session.
pub struct Autosave<S> {
    session: SharedSession<S>,
    sender: UnboundedSender<()>,
}

impl<S> fmt::Debug for Autosave<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autosave")
            .field("running", &!self.sender.is_closed())
            .finish()
    }
}

impl<S: NoteStorage + 'static> Autosave<S> {
    /// Spawns the autosave task for `session`.
    ///
    /// On native targets this must be called from within a `tokio` `LocalSet`.
    pub fn start(session: SharedSession<S>) -> Self {
        let (sender, receiver) = mpsc::unbounded();
        let mut handler = AutosaveHandler {
            session: session.clone(),
            receiver,
        };
        spawn_local(async move {
            handler.run().await;
        });
        Self { session, sender }
    }

    pub fn session(&self) -> &SharedSession<S> {
        &self.session
    }

    /// Tells the task that the session's deadline may have changed.
    pub fn wake(&self) {
        let _ = self.sender.unbounded_send(());
    }

    /// Records a content edit stamped with the current time and wakes the task.
    pub fn edit_content<T: Into<String>>(&self, content: T) -> Result<(), SessionError> {
        self.session
            .borrow_mut()
            .edit_content(content, Instant::now())?;
        self.wake();
        Ok(())
    }

    /// Creates a note stamped with the current time and wakes the task, so a
    /// delayed creation completes without further calls.
    pub fn create_note(&self) -> Result<NoteId, SessionError> {
        let id = self.session.borrow_mut().create_note(Instant::now())?;
        self.wake();
        Ok(id)
    }

    /// Deletes the open note after confirmation and wakes the task to finish
    /// closing it.
    pub fn delete_note<P: ConfirmPrompt>(&self, prompt: &mut P) -> Result<bool, SessionError> {
        let deleted = self
            .session
            .borrow_mut()
            .delete_note(prompt, Instant::now())?;
        self.wake();
        Ok(deleted)
    }

    /// Stops the task.
    pub fn stop(&self) {
        self.sender.close_channel();
    }
}

impl<S> Drop for Autosave<S> {
    fn drop(&mut self) {
        self.sender.close_channel();
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use super::*;
    use crate::{
        option::EditSessionOptions, session::SessionState, storage::MemoryStorage,
        store::NoteStore,
    };
    use std::time::Duration;
    use tokio::task::LocalSet;

    fn shared_session(options: EditSessionOptions) -> SharedSession<MemoryStorage> {
        Rc::new(RefCell::new(EditSession::new(
            NoteStore::new(MemoryStorage::new()),
            options,
        )))
    }

    fn fast_options() -> EditSessionOptions {
        EditSessionOptions::builder()
            .debounce(Duration::from_millis(100))
            .creation_delay(Duration::ZERO)
            .closing_delay(Duration::ZERO)
            .build()
    }

    #[tokio::test]
    async fn test_flushes_after_quiet_period() {
        LocalSet::new()
            .run_until(async {
                let session = shared_session(fast_options());
                let autosave = Autosave::start(session.clone());
                let id = session.borrow_mut().create_note(Instant::now()).unwrap();

                autosave.edit_content("<p>autosaved</p>").unwrap();
                assert!(session.borrow().is_dirty());

                tokio::time::sleep(Duration::from_millis(300)).await;

                let mut session = session.borrow_mut();
                assert!(!session.is_dirty());
                assert_eq!(
                    session.store_mut().get(&id).unwrap().content,
                    "<p>autosaved</p>"
                );
            })
            .await;
    }

    #[tokio::test]
    async fn test_edits_restart_the_window() {
        LocalSet::new()
            .run_until(async {
                let session = shared_session(fast_options());
                let autosave = Autosave::start(session.clone());
                let id = session.borrow_mut().create_note(Instant::now()).unwrap();

                for i in 0..5 {
                    autosave.edit_content(format!("<p>{i}</p>")).unwrap();
                    tokio::time::sleep(Duration::from_millis(30)).await;
                }
                assert!(session.borrow().is_dirty());

                tokio::time::sleep(Duration::from_millis(300)).await;
                assert_eq!(
                    session.borrow_mut().store_mut().get(&id).unwrap().content,
                    "<p>4</p>"
                );
            })
            .await;
    }

    #[tokio::test]
    async fn test_completes_delayed_creation() {
        LocalSet::new()
            .run_until(async {
                let options = EditSessionOptions::builder()
                    .creation_delay(Duration::from_millis(100))
                    .build();
                let session = shared_session(options);
                let autosave = Autosave::start(session.clone());

                let id = autosave.create_note().unwrap();
                assert!(matches!(
                    session.borrow().state(),
                    SessionState::Loading { .. }
                ));

                tokio::time::sleep(Duration::from_millis(300)).await;
                assert_eq!(session.borrow().active_id(), Some(&id));
            })
            .await;
    }

    #[tokio::test]
    async fn test_completes_delayed_close_after_delete() {
        LocalSet::new()
            .run_until(async {
                let options = EditSessionOptions::builder()
                    .creation_delay(Duration::ZERO)
                    .closing_delay(Duration::from_millis(100))
                    .build();
                let session = shared_session(options);
                let autosave = Autosave::start(session.clone());

                let id = autosave.create_note().unwrap();
                assert_eq!(session.borrow().active_id(), Some(&id));
                assert!(autosave.delete_note(&mut |_: &str| true).unwrap());
                assert!(matches!(
                    session.borrow().state(),
                    SessionState::ClosingForDelete { .. }
                ));

                tokio::time::sleep(Duration::from_millis(300)).await;
                assert_eq!(session.borrow().state(), &SessionState::Empty);
            })
            .await;
    }

    #[tokio::test]
    async fn test_stopped_task_does_not_write() {
        LocalSet::new()
            .run_until(async {
                let session = shared_session(fast_options());
                let autosave = Autosave::start(session.clone());
                let id = session.borrow_mut().create_note(Instant::now()).unwrap();

                autosave.edit_content("<p>never written</p>").unwrap();
                drop(autosave);

                tokio::time::sleep(Duration::from_millis(300)).await;
                let mut session = session.borrow_mut();
                assert!(session.is_dirty());
                assert_ne!(
                    session.store_mut().get(&id).unwrap().content,
                    "<p>never written</p>"
                );
            })
            .await;
    }
}
