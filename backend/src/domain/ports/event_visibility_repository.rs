//! Port for the per-user inbox read model.
//!
//! An event is visible to a user when its end lies after the supplied
//! cutoff and at least one of these holds:
//!
//! - it has no city;
//! - the user actively subscribes to its city;
//! - the user has ever answered it, subscribed or not.
//!
//! Adapters must compute this as one set-based query and return rows
//! ordered by `published_at` descending. `image_url` on returned rows is
//! the event image or, failing that, the city image; the configured
//! fallback is applied by the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EventId, UserEvent, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by visibility read-model adapters.
    pub enum EventVisibilityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "visibility query connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "visibility query failed: {message}",
    }
}

/// Per-user visibility queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventVisibilityRepository: Send + Sync {
    /// Every event visible to `user_id`.
    async fn visible_events(
        &self,
        user_id: &UserId,
        ends_after: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>, EventVisibilityRepositoryError>;

    /// One event, when visible to `user_id`.
    async fn visible_event(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        ends_after: DateTime<Utc>,
    ) -> Result<Option<UserEvent>, EventVisibilityRepositoryError>;
}
