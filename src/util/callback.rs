//! Event callback handed to an [`EditSession`](crate::session::EditSession).

use crate::session::SessionEvent;
use parking_lot::Mutex;
use std::{fmt, sync::Arc};

pub(crate) type OnEventInner = Box<dyn FnMut(&SessionEvent) + Send>;

/// The callback executed for every [`SessionEvent`], taking the event by reference.
///
/// # Usage
/// ```
/// use noteaway::callback::OnEvent;
///
/// let on_event = OnEvent::from(|event: &noteaway::session::SessionEvent| {
///     println!("{event:?}");
/// });
/// ```
#[derive(Clone)]
pub struct OnEvent(pub(crate) Arc<Mutex<OnEventInner>>);

impl OnEvent {
    pub(crate) fn call(&self, event: &SessionEvent) {
        let mut callback = self.0.lock();
        (*callback)(event)
    }
}

impl<F> From<F> for OnEvent
where
    F: FnMut(&SessionEvent) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnEvent(Arc::new(Mutex::new(Box::new(f))))
    }
}

impl fmt::Debug for OnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnEvent")
    }
}
