//! Driving port for device push token registration.

use async_trait::async_trait;

use crate::domain::{Error, PushToken, PushTokenId, UserId};

/// Token submitted by a mobile client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTokenRegistration {
    /// Raw provider token.
    pub token: String,
    /// Android device id; absent on iOS.
    pub device_id: Option<String>,
}

/// Register and retire device tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushTokenCommand: Send + Sync {
    /// Register a token, or re-enable it when already known.
    async fn register_token(
        &self,
        user_id: &UserId,
        registration: PushTokenRegistration,
    ) -> Result<PushToken, Error>;

    /// Tear down a token's topic subscriptions and delete it.
    async fn remove_token(&self, user_id: &UserId, id: &PushTokenId) -> Result<(), Error>;
}
