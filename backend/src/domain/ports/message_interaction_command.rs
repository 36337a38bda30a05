//! Driving port for message read state.

use async_trait::async_trait;

use crate::domain::{Error, MessageTarget, StoredMessageState, UserId};

/// Mark messages as seen or deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageInteractionCommand: Send + Sync {
    /// Record `state` for the user and message; repeating a state is a no-op.
    async fn interact_with_message(
        &self,
        user_id: &UserId,
        target: MessageTarget,
        state: StoredMessageState,
    ) -> Result<(), Error>;
}
