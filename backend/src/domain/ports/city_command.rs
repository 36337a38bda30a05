//! Driving port for city mutations.

use async_trait::async_trait;

use crate::domain::{City, CityId, CityPatch, Error, NewCity};

/// City registration and maintenance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CityCommand: Send + Sync {
    /// Register a city, resolving its timezone from the location.
    async fn register(&self, city: NewCity) -> Result<City, Error>;

    /// Patch a city. The test city is immutable.
    async fn update(&self, id: &CityId, patch: CityPatch) -> Result<City, Error>;

    /// Remove a city with no events, cascading to its subscriptions.
    async fn remove(&self, id: &CityId) -> Result<(), Error>;
}
