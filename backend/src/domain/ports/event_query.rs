//! Driving port for admin event reads.

use async_trait::async_trait;

use crate::domain::{AdminEvent, CityId, Error, EventId};

/// Admin event listings with attendance aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventQuery: Send + Sync {
    /// Every event.
    async fn get_all(&self) -> Result<Vec<AdminEvent>, Error>;

    /// Events held in one city.
    async fn get_all_in_city(&self, city_id: &CityId) -> Result<Vec<AdminEvent>, Error>;

    /// One event, or `None` when absent.
    async fn find_by_id(&self, id: &EventId) -> Result<Option<AdminEvent>, Error>;

    /// One event, or `not_found` when absent.
    async fn get_by_id(&self, id: &EventId) -> Result<AdminEvent, Error>;
}
