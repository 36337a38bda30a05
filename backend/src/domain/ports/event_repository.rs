//! Port for event persistence and admin read models.

use async_trait::async_trait;

use crate::domain::{AdminEvent, CityId, Event, EventId, EventKey};

use super::define_port_error;

define_port_error! {
    /// Errors raised by event repository adapters.
    pub enum EventRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "event repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "event repository query failed: {message}",
        /// The (name, start, end, city) tuple is already taken.
        Duplicate { message: String } =>
            "event already exists: {message}",
        /// A multi-statement write was rolled back.
        Transaction { message: String } =>
            "event transaction failed: {message}",
    }
}

/// Port for event storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Fetch an event by id.
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, EventRepositoryError>;

    /// Whether another event already uses `key`, ignoring `excluding`.
    async fn exists_with_key(
        &self,
        key: &EventKey,
        excluding: Option<EventId>,
    ) -> Result<bool, EventRepositoryError>;

    /// Insert a new event.
    async fn insert(&self, event: &Event) -> Result<(), EventRepositoryError>;

    /// Overwrite an existing event.
    async fn update(&self, event: &Event) -> Result<(), EventRepositoryError>;

    /// Delete message interactions, registrations, then the event in one
    /// transaction. Returns `false` when the event did not exist.
    async fn delete_cascade(&self, id: &EventId) -> Result<bool, EventRepositoryError>;

    /// Events with attendance aggregates, optionally restricted to a city.
    async fn list_admin(
        &self,
        city_id: Option<CityId>,
    ) -> Result<Vec<AdminEvent>, EventRepositoryError>;

    /// One event with attendance aggregates.
    async fn find_admin(&self, id: &EventId) -> Result<Option<AdminEvent>, EventRepositoryError>;
}
