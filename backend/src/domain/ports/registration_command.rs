//! Driving port for attendance answers.

use async_trait::async_trait;

use crate::domain::{Error, EventId, UserEvent, UserId};

/// Record going/not-going answers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Create or update the answer and return the affected inbox event.
    async fn register(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        going: bool,
    ) -> Result<UserEvent, Error>;
}
