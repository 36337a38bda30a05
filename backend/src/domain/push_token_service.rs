//! Device push token registration.
//!
//! A new token gets a platform endpoint and a subscription to the broadcast
//! topic. Registering a known token again re-enables its endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::notification_fanout::NotificationFanoutService;
use super::service_errors::map_push_token_error;
use crate::domain::ports::{
    PushGateway, PushTokenCommand, PushTokenRegistration, PushTokenRepository,
};
use crate::domain::{Error, PushSubscription, PushToken, PushTokenId, UserId};

/// Service implementing [`PushTokenCommand`].
#[derive(Clone)]
pub struct PushTokenService<G, P> {
    fanout: Arc<NotificationFanoutService<G, P>>,
    tokens: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<G, P> PushTokenService<G, P> {
    /// Create the service.
    pub fn new(
        fanout: Arc<NotificationFanoutService<G, P>>,
        tokens: Arc<P>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fanout,
            tokens,
            clock,
        }
    }
}

impl<G, P> PushTokenService<G, P>
where
    G: PushGateway,
    P: PushTokenRepository,
{
    async fn reactivate(&self, user_id: &UserId, mut token: PushToken) -> Result<PushToken, Error> {
        if token.user_id != *user_id {
            return Err(Error::conflict("push token is registered to another user"));
        }
        self.fanout.enable_endpoint(&token.endpoint_arn).await?;
        self.tokens
            .set_enabled(&token.id, true)
            .await
            .map_err(map_push_token_error)?;
        token.enabled = true;
        Ok(token)
    }
}

#[async_trait]
impl<G, P> PushTokenCommand for PushTokenService<G, P>
where
    G: PushGateway,
    P: PushTokenRepository,
{
    async fn register_token(
        &self,
        user_id: &UserId,
        registration: PushTokenRegistration,
    ) -> Result<PushToken, Error> {
        if registration.token.trim().is_empty() {
            return Err(Error::invalid_request("token must not be empty")
                .with_details(serde_json::json!({ "field": "token", "code": "empty" })));
        }
        let existing = self
            .tokens
            .find_by_token(&registration.token)
            .await
            .map_err(map_push_token_error)?;
        if let Some(token) = existing {
            return self.reactivate(user_id, token).await;
        }

        let endpoint_arn = self
            .fanout
            .generate_platform_endpoint_arn(&registration.token, registration.device_id.as_deref())
            .await?;
        let token = PushToken {
            id: PushTokenId::random(),
            user_id: user_id.clone(),
            token: registration.token,
            device_id: registration.device_id,
            endpoint_arn,
            enabled: true,
            created_at: self.clock.utc(),
        };
        self.tokens
            .insert(&token)
            .await
            .map_err(map_push_token_error)?;

        let arn = self.fanout.subscribe_to_topic(&token.endpoint_arn).await?;
        self.tokens
            .add_subscription(&PushSubscription {
                user_id: user_id.clone(),
                push_token_id: token.id,
                arn,
            })
            .await
            .map_err(map_push_token_error)?;
        info!(user_id = %user_id, token_id = %token.id, "push token registered");
        Ok(token)
    }

    async fn remove_token(&self, user_id: &UserId, id: &PushTokenId) -> Result<(), Error> {
        let token = self
            .tokens
            .find_by_id(id)
            .await
            .map_err(map_push_token_error)?
            .ok_or_else(|| Error::not_found(format!("push token {id} not found")))?;
        if token.user_id != *user_id {
            return Err(Error::forbidden("push token belongs to another user"));
        }
        let subscriptions = self
            .tokens
            .subscriptions_for_token(id)
            .await
            .map_err(map_push_token_error)?;
        for subscription in &subscriptions {
            self.fanout.unsubscribe_from_topic(&subscription.arn).await?;
        }
        self.tokens
            .delete_with_subscriptions(id)
            .await
            .map_err(map_push_token_error)?;
        info!(user_id = %user_id, token_id = %id, "push token removed");
        Ok(())
    }
}
