//! Driving port for subscription reads.

use async_trait::async_trait;

use crate::domain::{City, CitySubscription, CitySubscriptionSummary, Error, UserId};

/// Subscription lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionQuery: Send + Sync {
    /// Cities the user subscribes to, alphabetically.
    async fn subscribed_cities(&self, user_id: &UserId) -> Result<Vec<City>, Error>;

    /// Raw subscriptions of the user.
    async fn subscriptions(&self, user_id: &UserId) -> Result<Vec<CitySubscription>, Error>;

    /// Subscriber counts for every city.
    async fn summaries(&self) -> Result<Vec<CitySubscriptionSummary>, Error>;
}
