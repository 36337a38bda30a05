//! Port for attendance answers.

use async_trait::async_trait;

use crate::domain::{EventId, EventRegistration, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by registration repository adapters.
    pub enum EventRegistrationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "registration repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "registration repository query failed: {message}",
        /// A registration already exists for the pair.
        Duplicate { message: String } =>
            "registration already exists: {message}",
    }
}

/// Port for registration storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRegistrationRepository: Send + Sync {
    /// The registration for the pair, if any.
    async fn find(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<EventRegistration>, EventRegistrationRepositoryError>;

    /// Insert a first answer.
    async fn insert(
        &self,
        registration: &EventRegistration,
    ) -> Result<(), EventRegistrationRepositoryError>;

    /// Change an existing answer. Returns `false` when no row matched.
    async fn update_going(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        going: bool,
    ) -> Result<bool, EventRegistrationRepositoryError>;
}
