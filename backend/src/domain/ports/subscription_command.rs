//! Driving port for subscribing users to city events.

use async_trait::async_trait;

use crate::domain::{City, CityId, Error, UserId};

/// Subscription mutations. Both return the user's updated city list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionCommand: Send + Sync {
    /// Subscribe; `conflict` when already subscribed.
    async fn subscribe(&self, user_id: &UserId, city_id: &CityId) -> Result<Vec<City>, Error>;

    /// Unsubscribe; `not_found` when not subscribed.
    async fn unsubscribe(&self, user_id: &UserId, city_id: &CityId) -> Result<Vec<City>, Error>;
}
