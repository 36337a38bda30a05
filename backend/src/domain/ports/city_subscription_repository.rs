//! Port for user-to-city subscriptions.
//!
//! Unsubscribing soft-deletes the row so it can be restored on the next
//! subscribe. Only rows without a deletion mark count as active.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{City, CityId, CitySubscription, CitySubscriptionSummary, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by subscription repository adapters.
    pub enum CitySubscriptionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "subscription repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "subscription repository query failed: {message}",
        /// An active subscription already exists for the pair.
        Duplicate { message: String } =>
            "subscription already exists: {message}",
    }
}

/// Port for subscription storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CitySubscriptionRepository: Send + Sync {
    /// The active subscription for the pair, if any.
    async fn find_active(
        &self,
        user_id: &UserId,
        city_id: &CityId,
    ) -> Result<Option<CitySubscription>, CitySubscriptionRepositoryError>;

    /// Create the subscription, or restore a soft-deleted one.
    async fn subscribe(
        &self,
        subscription: &CitySubscription,
    ) -> Result<(), CitySubscriptionRepositoryError>;

    /// Soft-delete the active subscription. Returns `false` when none existed.
    async fn unsubscribe(
        &self,
        user_id: &UserId,
        city_id: &CityId,
        at: DateTime<Utc>,
    ) -> Result<bool, CitySubscriptionRepositoryError>;

    /// Cities the user is actively subscribed to, ordered by name.
    async fn subscribed_cities(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<City>, CitySubscriptionRepositoryError>;

    /// Active subscriptions of the user, ordered by city name.
    async fn subscriptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CitySubscription>, CitySubscriptionRepositoryError>;

    /// Subscriber counts for every city, zero-subscriber cities included.
    async fn summaries(&self)
    -> Result<Vec<CitySubscriptionSummary>, CitySubscriptionRepositoryError>;
}
