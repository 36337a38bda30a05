//! City subscription service.
//!
//! Subscriptions are the only source of truth for which users see and get
//! notified about a city's events.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::service_errors::{map_city_error, map_subscription_error, map_user_directory_error};
use crate::domain::ports::{
    CityRepository, CitySubscriptionRepository, SubscriptionCommand, SubscriptionQuery,
    UserDirectory,
};
use crate::domain::{City, CityId, CitySubscription, CitySubscriptionSummary, Error, UserId};

/// Subscription service implementing the subscription driving ports.
#[derive(Clone)]
pub struct CitySubscriptionService<U, C, S> {
    users: Arc<U>,
    cities: Arc<C>,
    subscriptions: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<U, C, S> CitySubscriptionService<U, C, S> {
    /// Create the service.
    pub fn new(
        users: Arc<U>,
        cities: Arc<C>,
        subscriptions: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            cities,
            subscriptions,
            clock,
        }
    }
}

impl<U, C, S> CitySubscriptionService<U, C, S>
where
    U: UserDirectory,
    C: CityRepository,
    S: CitySubscriptionRepository,
{
    async fn ensure_user(&self, user_id: &UserId) -> Result<(), Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_directory_error)?;
        if user.is_none() {
            return Err(Error::not_found(format!("user {user_id} not found")));
        }
        Ok(())
    }

    /// Both lookups run before failing so the message names every miss.
    async fn ensure_user_and_city(&self, user_id: &UserId, city_id: &CityId) -> Result<(), Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_directory_error)?;
        let city = self
            .cities
            .find_by_id(city_id)
            .await
            .map_err(map_city_error)?;
        let message = match (user.is_some(), city.is_some()) {
            (true, true) => return Ok(()),
            (false, true) => format!("user {user_id} not found"),
            (true, false) => format!("city {city_id} not found"),
            (false, false) => format!("user {user_id} and city {city_id} not found"),
        };
        Err(Error::not_found(message))
    }

    async fn list_cities(&self, user_id: &UserId) -> Result<Vec<City>, Error> {
        self.subscriptions
            .subscribed_cities(user_id)
            .await
            .map_err(map_subscription_error)
    }
}

#[async_trait]
impl<U, C, S> SubscriptionCommand for CitySubscriptionService<U, C, S>
where
    U: UserDirectory,
    C: CityRepository,
    S: CitySubscriptionRepository,
{
    async fn subscribe(&self, user_id: &UserId, city_id: &CityId) -> Result<Vec<City>, Error> {
        self.ensure_user_and_city(user_id, city_id).await?;
        let existing = self
            .subscriptions
            .find_active(user_id, city_id)
            .await
            .map_err(map_subscription_error)?;
        if existing.is_some() {
            return Err(Error::conflict(format!(
                "user {user_id} is already subscribed to city {city_id}"
            )));
        }
        let subscription = CitySubscription {
            user_id: user_id.clone(),
            city_id: *city_id,
            created_at: self.clock.utc(),
        };
        self.subscriptions
            .subscribe(&subscription)
            .await
            .map_err(map_subscription_error)?;
        info!(user_id = %user_id, city_id = %city_id, "subscribed to city events");
        self.list_cities(user_id).await
    }

    async fn unsubscribe(&self, user_id: &UserId, city_id: &CityId) -> Result<Vec<City>, Error> {
        self.ensure_user_and_city(user_id, city_id).await?;
        let removed = self
            .subscriptions
            .unsubscribe(user_id, city_id, self.clock.utc())
            .await
            .map_err(map_subscription_error)?;
        if !removed {
            return Err(Error::not_found(format!(
                "user {user_id} is not subscribed to city {city_id}"
            )));
        }
        info!(user_id = %user_id, city_id = %city_id, "unsubscribed from city events");
        self.list_cities(user_id).await
    }
}

#[async_trait]
impl<U, C, S> SubscriptionQuery for CitySubscriptionService<U, C, S>
where
    U: UserDirectory,
    C: CityRepository,
    S: CitySubscriptionRepository,
{
    async fn subscribed_cities(&self, user_id: &UserId) -> Result<Vec<City>, Error> {
        self.ensure_user(user_id).await?;
        self.list_cities(user_id).await
    }

    async fn subscriptions(&self, user_id: &UserId) -> Result<Vec<CitySubscription>, Error> {
        self.ensure_user(user_id).await?;
        self.subscriptions
            .subscriptions(user_id)
            .await
            .map_err(map_subscription_error)
    }

    async fn summaries(&self) -> Result<Vec<CitySubscriptionSummary>, Error> {
        self.subscriptions
            .summaries()
            .await
            .map_err(map_subscription_error)
    }
}
