//! Port for city persistence.
//!
//! Adapters enforce name uniqueness independently of the service pre-check
//! and surface violations as [`CityRepositoryError::Duplicate`].

use async_trait::async_trait;

use crate::domain::{City, CityId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by city repository adapters.
    pub enum CityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "city repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "city repository query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Duplicate { message: String } =>
            "city already exists: {message}",
    }
}

/// Port for reading and writing city records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CityRepository: Send + Sync {
    /// Fetch a city by id.
    async fn find_by_id(&self, id: &CityId) -> Result<Option<City>, CityRepositoryError>;

    /// Fetch a city by exact name.
    async fn find_by_name(&self, name: &str) -> Result<Option<City>, CityRepositoryError>;

    /// All cities, including the test city, ordered by name.
    async fn list(&self) -> Result<Vec<City>, CityRepositoryError>;

    /// Insert a new city.
    async fn insert(&self, city: &City) -> Result<(), CityRepositoryError>;

    /// Overwrite an existing city.
    async fn update(&self, city: &City) -> Result<(), CityRepositoryError>;

    /// Number of events that reference the city.
    async fn count_events(&self, id: &CityId) -> Result<u64, CityRepositoryError>;

    /// Hard-delete every subscription to the city, then the city itself,
    /// in one transaction.
    async fn delete_with_subscriptions(&self, id: &CityId) -> Result<(), CityRepositoryError>;
}
