//! Per-user message read state.
//!
//! Only `seen` and `deleted` are ever stored. A missing row means the user
//! has not interacted with the message yet, which is surfaced as
//! [`MessageState::New`] by the read paths and nowhere else.

use serde::{Deserialize, Serialize};

use super::EventId;

/// Read state exposed to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    /// No interaction recorded.
    #[default]
    New,
    /// Opened at least once.
    Seen,
    /// Dismissed by the user.
    Deleted,
}

impl MessageState {
    /// Map the optional stored row onto the API state.
    #[must_use]
    pub const fn from_stored(stored: Option<StoredMessageState>) -> Self {
        match stored {
            None => Self::New,
            Some(StoredMessageState::Seen) => Self::Seen,
            Some(StoredMessageState::Deleted) => Self::Deleted,
        }
    }
}

/// State values that can be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredMessageState {
    /// Opened at least once.
    Seen,
    /// Dismissed by the user.
    Deleted,
}

impl StoredMessageState {
    /// Column representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seen => "seen",
            Self::Deleted => "deleted",
        }
    }

    /// Parse the column representation.
    #[must_use]
    pub fn from_column(value: &str) -> Option<Self> {
        match value {
            "seen" => Some(Self::Seen),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// What a message refers to. Events are the only kind today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTarget {
    /// An event notification.
    Event {
        /// The referenced event.
        event_id: EventId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, MessageState::New)]
    #[case(Some(StoredMessageState::Seen), MessageState::Seen)]
    #[case(Some(StoredMessageState::Deleted), MessageState::Deleted)]
    fn absent_rows_read_as_new(
        #[case] stored: Option<StoredMessageState>,
        #[case] expected: MessageState,
    ) {
        assert_eq!(MessageState::from_stored(stored), expected);
    }

    #[rstest]
    #[case(StoredMessageState::Seen)]
    #[case(StoredMessageState::Deleted)]
    fn column_values_parse_back(#[case] state: StoredMessageState) {
        assert_eq!(StoredMessageState::from_column(state.as_str()), Some(state));
    }

    #[rstest]
    fn unknown_column_values_are_rejected() {
        assert_eq!(StoredMessageState::from_column("new"), None);
    }
}
