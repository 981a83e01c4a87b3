//! Edit session options and configuration types.

use crate::{
    callback::OnEvent,
    note::{DEFAULT_TITLE, SEED_CONTENT},
};
use std::time::Duration;

/// Options for [`EditSession::new`](crate::session::EditSession::new).
///
/// Every field is optional; unset fields fall back to the defaults exposed as
/// associated constants.
#[derive(Clone, Debug, Default, bon::Builder)]
pub struct EditSessionOptions {
    /// Quiet period after the last content edit before it is written. If not provided, 200 milliseconds will be used.
    pub debounce: Option<Duration>,

    /// Pause between creating a note and opening it. If not provided, 500 milliseconds will be used.
    pub creation_delay: Option<Duration>,

    /// Pause between deleting a note and returning to the empty state. If not provided, 500 milliseconds will be used.
    pub closing_delay: Option<Duration>,

    /// Title given to new notes and stored for notes whose title is cleared.
    #[builder(into)]
    pub default_title: Option<String>,

    /// Markup seeded into new notes.
    #[builder(into)]
    pub seed_content: Option<String>,

    /// Callback receiving every session event.
    #[builder(into)]
    pub on_event: Option<OnEvent>,
}

impl EditSessionOptions {
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);
    pub const DEFAULT_CREATION_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_CLOSING_DELAY: Duration = Duration::from_millis(500);

    /// Options with every delay set to zero, so transitions complete
    /// synchronously and only content edits wait for a [`poll`](crate::session::EditSession::poll).
    pub fn immediate() -> Self {
        Self {
            creation_delay: Some(Duration::ZERO),
            closing_delay: Some(Duration::ZERO),
            ..Self::default()
        }
    }

    pub(crate) fn debounce(&self) -> Duration {
        self.debounce.unwrap_or(Self::DEFAULT_DEBOUNCE)
    }

    pub(crate) fn creation_delay(&self) -> Duration {
        self.creation_delay.unwrap_or(Self::DEFAULT_CREATION_DELAY)
    }

    pub(crate) fn closing_delay(&self) -> Duration {
        self.closing_delay.unwrap_or(Self::DEFAULT_CLOSING_DELAY)
    }

    pub(crate) fn default_title(&self) -> &str {
        self.default_title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub(crate) fn seed_content(&self) -> &str {
        self.seed_content.as_deref().unwrap_or(SEED_CONTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = EditSessionOptions::builder()
            .debounce(Duration::from_millis(50))
            .creation_delay(Duration::ZERO)
            .default_title("Untitled")
            .on_event(|_: &crate::session::SessionEvent| {})
            .build();
        assert_eq!(options.debounce(), Duration::from_millis(50));
        assert_eq!(options.creation_delay(), Duration::ZERO);
        assert_eq!(
            options.closing_delay(),
            EditSessionOptions::DEFAULT_CLOSING_DELAY
        );
        assert_eq!(options.default_title(), "Untitled");
        assert_eq!(options.seed_content(), SEED_CONTENT);
        assert!(options.on_event.is_some());
    }

    #[test]
    fn test_options_default() {
        let options = EditSessionOptions::default();
        assert_eq!(options.debounce(), EditSessionOptions::DEFAULT_DEBOUNCE);
        assert_eq!(options.default_title(), DEFAULT_TITLE);
        assert!(options.on_event.is_none());
    }
}
