//! City registry service.
//!
//! Implements [`CityCommand`] and [`CityQuery`]. One configured city is the
//! test city: it is hidden from regular users and can be neither edited nor
//! removed through this service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::service_errors::{map_city_error, map_subscription_error};
use crate::domain::ports::{
    CityCommand, CityQuery, CityRepository, CitySubscriptionRepository, TimezoneLookup,
    TimezoneLookupError,
};
use crate::domain::{
    City, CityId, CityPatch, Error, GeoPoint, NewCity, UserId, nearest_containing,
    sort_by_distance, sort_by_name,
};

/// Options the registry reads at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityRegistryConfig {
    /// Radius applied when a new city omits one.
    pub default_radius_m: u32,
    /// The protected fixture city.
    pub test_city_id: CityId,
}

/// City registry implementing the city driving ports.
#[derive(Clone)]
pub struct CityRegistryService<C, S, T> {
    cities: Arc<C>,
    subscriptions: Arc<S>,
    timezones: Arc<T>,
    clock: Arc<dyn Clock>,
    config: CityRegistryConfig,
}

impl<C, S, T> CityRegistryService<C, S, T> {
    /// Create the service.
    pub fn new(
        cities: Arc<C>,
        subscriptions: Arc<S>,
        timezones: Arc<T>,
        clock: Arc<dyn Clock>,
        config: CityRegistryConfig,
    ) -> Self {
        Self {
            cities,
            subscriptions,
            timezones,
            clock,
            config,
        }
    }

    fn is_test_city(&self, id: &CityId) -> bool {
        *id == self.config.test_city_id
    }

    fn reject_test_city(&self, id: &CityId) -> Result<(), Error> {
        if self.is_test_city(id) {
            return Err(Error::forbidden("the test city cannot be modified"));
        }
        Ok(())
    }
}

fn map_timezone_error(error: TimezoneLookupError) -> Error {
    match error {
        TimezoneLookupError::Transport { message } => {
            Error::service_unavailable(format!("timezone lookup unavailable: {message}"))
        }
        TimezoneLookupError::Decode { message } => {
            Error::internal(format!("timezone lookup error: {message}"))
        }
        TimezoneLookupError::NotFound { .. } => Error::invalid_request(
            "no timezone covers the city location",
        )
        .with_details(serde_json::json!({ "field": "location", "code": "no_timezone" })),
    }
}

impl<C, S, T> CityRegistryService<C, S, T>
where
    C: CityRepository,
    S: CitySubscriptionRepository,
    T: TimezoneLookup,
{
    async fn existing(&self, id: &CityId) -> Result<City, Error> {
        self.cities
            .find_by_id(id)
            .await
            .map_err(map_city_error)?
            .ok_or_else(|| Error::not_found(format!("city {id} not found")))
    }

    async fn ensure_name_free(&self, name: &str, owner: Option<CityId>) -> Result<(), Error> {
        let taken = self
            .cities
            .find_by_name(name)
            .await
            .map_err(map_city_error)?
            .is_some_and(|city| Some(city.id) != owner);
        if taken {
            return Err(Error::conflict(format!("city {name} already exists")));
        }
        Ok(())
    }
}

#[async_trait]
impl<C, S, T> CityCommand for CityRegistryService<C, S, T>
where
    C: CityRepository,
    S: CitySubscriptionRepository,
    T: TimezoneLookup,
{
    async fn register(&self, city: NewCity) -> Result<City, Error> {
        self.ensure_name_free(&city.name, None).await?;
        let timezone = self
            .timezones
            .timezone_for(&city.location)
            .await
            .map_err(map_timezone_error)?;
        let now = self.clock.utc();
        let city = City {
            id: CityId::random(),
            name: city.name,
            location: city.location,
            radius_m: city.radius_m.unwrap_or(self.config.default_radius_m),
            timezone,
            image_url: city.image_url,
            created_at: now,
            updated_at: now,
        };
        self.cities.insert(&city).await.map_err(map_city_error)?;
        info!(city_id = %city.id, name = %city.name, "city registered");
        Ok(city)
    }

    async fn update(&self, id: &CityId, patch: CityPatch) -> Result<City, Error> {
        self.reject_test_city(id)?;
        let current = self.existing(id).await?;
        if let Some(name) = patch.name.as_deref() {
            self.ensure_name_free(name, Some(current.id)).await?;
        }
        let updated = patch.apply(current, self.clock.utc());
        self.cities.update(&updated).await.map_err(map_city_error)?;
        Ok(updated)
    }

    async fn remove(&self, id: &CityId) -> Result<(), Error> {
        self.reject_test_city(id)?;
        self.existing(id).await?;
        let events = self.cities.count_events(id).await.map_err(map_city_error)?;
        if events > 0 {
            return Err(Error::conflict(format!(
                "city {id} still has {events} event(s)"
            )));
        }
        self.cities
            .delete_with_subscriptions(id)
            .await
            .map_err(map_city_error)?;
        info!(city_id = %id, "city removed");
        Ok(())
    }
}

#[async_trait]
impl<C, S, T> CityQuery for CityRegistryService<C, S, T>
where
    C: CityRepository,
    S: CitySubscriptionRepository,
    T: TimezoneLookup,
{
    async fn get_by_id(&self, id: &CityId) -> Result<City, Error> {
        self.existing(id).await
    }

    async fn get_all(&self, include_test_city: bool) -> Result<Vec<City>, Error> {
        let mut cities = self.cities.list().await.map_err(map_city_error)?;
        if !include_test_city {
            cities.retain(|city| !self.is_test_city(&city.id));
        }
        Ok(cities)
    }

    async fn possible_cities_to_subscribe(
        &self,
        user_id: &UserId,
        is_admin: bool,
        origin: Option<GeoPoint>,
    ) -> Result<Vec<City>, Error> {
        let subscribed = self
            .subscriptions
            .subscriptions(user_id)
            .await
            .map_err(map_subscription_error)?;
        let mut cities = self.get_all(is_admin).await?;
        cities.retain(|city| !subscribed.iter().any(|sub| sub.city_id == city.id));
        match origin {
            Some(origin) => sort_by_distance(&mut cities, &origin),
            None => sort_by_name(&mut cities),
        }
        Ok(cities)
    }

    async fn city_at(&self, point: GeoPoint) -> Result<Option<City>, Error> {
        let cities = self.get_all(false).await?;
        Ok(nearest_containing(&cities, &point).cloned())
    }
}

#[cfg(test)]
#[path = "city_service_tests.rs"]
mod tests;
