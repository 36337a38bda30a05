//! Driving port for per-user event visibility.

use async_trait::async_trait;

use crate::domain::{Error, EventId, UserEvent, UserId};

/// Inbox event reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventVisibilityQuery: Send + Sync {
    /// Events visible to the user with attendance and read state.
    async fn upcoming_events_with_going_status(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserEvent>, Error>;

    /// One visible event; optionally marks a new message as seen.
    async fn single_event_for_user(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        change_to_read: bool,
    ) -> Result<UserEvent, Error>;
}
