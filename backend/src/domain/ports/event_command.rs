//! Driving port for the event lifecycle.

use async_trait::async_trait;

use crate::domain::{AdminEvent, Error, EventId, EventPatch, NewEvent};

/// Event registration, update, and removal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventCommand: Send + Sync {
    /// Register and publish an event. Returns the refreshed admin listing.
    async fn register(&self, event: NewEvent) -> Result<Vec<AdminEvent>, Error>;

    /// Patch an event, republishing when its city changes.
    async fn update(&self, id: &EventId, patch: EventPatch) -> Result<AdminEvent, Error>;

    /// Remove an event and everything referencing it. Returns the refreshed
    /// admin listing.
    async fn remove(&self, id: &EventId) -> Result<Vec<AdminEvent>, Error>;
}
