//! Driving port for city reads.

use async_trait::async_trait;

use crate::domain::{City, CityId, Error, GeoPoint, UserId};

/// City lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CityQuery: Send + Sync {
    /// Fetch one city or fail with `not_found`.
    async fn get_by_id(&self, id: &CityId) -> Result<City, Error>;

    /// Every city, alphabetically, optionally including the test city.
    async fn get_all(&self, include_test_city: bool) -> Result<Vec<City>, Error>;

    /// Cities the user has not subscribed to yet.
    ///
    /// Non-admins never see the test city. With `origin` the list is ordered
    /// by distance, otherwise by name.
    async fn possible_cities_to_subscribe(
        &self,
        user_id: &UserId,
        is_admin: bool,
        origin: Option<GeoPoint>,
    ) -> Result<Vec<City>, Error>;

    /// The nearest non-test city whose radius contains `point`.
    async fn city_at(&self, point: GeoPoint) -> Result<Option<City>, Error>;
}
