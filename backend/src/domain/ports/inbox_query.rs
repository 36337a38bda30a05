//! Driving port for the combined inbox screen.

use async_trait::async_trait;

use crate::domain::{Error, Inbox, UserId};

/// Inbox composition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InboxQuery: Send + Sync {
    /// Events plus boards awaiting firmware updates.
    async fn inbox(&self, user_id: &UserId) -> Result<Inbox, Error>;
}
