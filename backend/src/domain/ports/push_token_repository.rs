//! Port for device push tokens and their topic subscriptions.

use async_trait::async_trait;

use crate::domain::{CityId, PushEndpoint, PushSubscription, PushToken, PushTokenId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by push token repository adapters.
    pub enum PushTokenRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "push token repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "push token repository query failed: {message}",
        /// The raw token is already registered.
        Duplicate { message: String } =>
            "push token already registered: {message}",
    }
}

/// Port for push token storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushTokenRepository: Send + Sync {
    /// Enabled endpoints of every user actively subscribed to the city.
    async fn enabled_endpoints_for_city(
        &self,
        city_id: &CityId,
    ) -> Result<Vec<PushEndpoint>, PushTokenRepositoryError>;

    /// Mark the given tokens as disabled in one statement.
    async fn disable(&self, ids: &[PushTokenId]) -> Result<u64, PushTokenRepositoryError>;

    /// Find a token by its raw provider value.
    async fn find_by_token(&self, token: &str)
    -> Result<Option<PushToken>, PushTokenRepositoryError>;

    /// Find a token by id.
    async fn find_by_id(
        &self,
        id: &PushTokenId,
    ) -> Result<Option<PushToken>, PushTokenRepositoryError>;

    /// Store a newly registered token.
    async fn insert(&self, token: &PushToken) -> Result<(), PushTokenRepositoryError>;

    /// Flip the enabled flag of one token.
    async fn set_enabled(
        &self,
        id: &PushTokenId,
        enabled: bool,
    ) -> Result<(), PushTokenRepositoryError>;

    /// Record a topic subscription for a token.
    async fn add_subscription(
        &self,
        subscription: &PushSubscription,
    ) -> Result<(), PushTokenRepositoryError>;

    /// Topic subscriptions recorded for a token.
    async fn subscriptions_for_token(
        &self,
        id: &PushTokenId,
    ) -> Result<Vec<PushSubscription>, PushTokenRepositoryError>;

    /// Delete a token and its subscription records in one transaction.
    async fn delete_with_subscriptions(
        &self,
        id: &PushTokenId,
    ) -> Result<(), PushTokenRepositoryError>;
}
