//! Port through which the event registry announces publications.

use async_trait::async_trait;

use crate::domain::{Error, EventPublication};

/// Receives every newly published or republished event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// Deliver notifications for `publication`.
    async fn event_published(&self, publication: &EventPublication) -> Result<(), Error>;
}

