//! Port for per-user message read state.

use async_trait::async_trait;

use crate::domain::{MessageTarget, StoredMessageState, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by message interaction adapters.
    pub enum MessageInteractionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "interaction repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "interaction repository query failed: {message}",
        /// A row already exists for the pair.
        Duplicate { message: String } =>
            "interaction already exists: {message}",
    }
}

/// Port for interaction storage. At most one row exists per pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageInteractionRepository: Send + Sync {
    /// Stored state for the pair; `None` means no interaction yet.
    async fn find(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
    ) -> Result<Option<StoredMessageState>, MessageInteractionRepositoryError>;

    /// Insert the first interaction.
    async fn insert(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
        state: StoredMessageState,
    ) -> Result<(), MessageInteractionRepositoryError>;

    /// Overwrite the stored state. Returns the number of rows changed.
    async fn update(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
        state: StoredMessageState,
    ) -> Result<u64, MessageInteractionRepositoryError>;
}
