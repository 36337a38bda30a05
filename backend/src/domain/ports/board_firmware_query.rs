//! Port for the legacy board firmware lookup shown in the inbox.

use async_trait::async_trait;

use crate::domain::{BoardFirmwareNotice, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by firmware lookup adapters.
    pub enum BoardFirmwareQueryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "firmware lookup connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "firmware lookup failed: {message}",
    }
}

/// Boards of a user that are behind the newest firmware release.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardFirmwareQuery: Send + Sync {
    /// Outdated boards owned by `user_id`.
    async fn outdated_boards(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<BoardFirmwareNotice>, BoardFirmwareQueryError>;
}

/// Fixture reporting every board as up to date.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBoardFirmwareQuery;

#[async_trait]
impl BoardFirmwareQuery for FixtureBoardFirmwareQuery {
    async fn outdated_boards(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<BoardFirmwareNotice>, BoardFirmwareQueryError> {
        Ok(Vec::new())
    }
}
