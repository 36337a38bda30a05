//! Notification fan-out engine.
//!
//! Global events are published once to the broadcast topic. City events are
//! published to every enabled endpoint of the city's subscribers with a
//! bounded number of calls in flight. Endpoints the gateway reports as
//! disabled are switched off in one bulk update after the batch.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{StreamExt as _, stream};
use tracing::{info, warn};

use super::service_errors::map_push_token_error;
use crate::domain::ports::{EventNotifier, PushGateway, PushGatewayError, PushTokenRepository};
use crate::domain::{
    EndpointArn, Error, EventCity, EventPublication, PlatformApplicationArn, PublishRequest,
    PushPlatform, PushTokenId, SubscriptionArn, TopicArn, build_event_message,
};

/// Default number of concurrent per-endpoint publishes.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;

/// Options the fan-out reads at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutConfig {
    /// Broadcast topic every endpoint is subscribed to.
    pub topic_arn: TopicArn,
    /// Upper bound on concurrent per-endpoint publishes.
    pub concurrency_limit: usize,
    /// Platform application for Android tokens.
    pub android_application_arn: PlatformApplicationArn,
    /// Platform application for iOS tokens.
    pub ios_application_arn: PlatformApplicationArn,
}

/// Outcome of a city broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Publishes accepted by the gateway.
    pub delivered: usize,
    /// Tokens disabled because their endpoint was gone.
    pub disabled: Vec<PushTokenId>,
}

fn map_gateway_error(error: PushGatewayError) -> Error {
    match error {
        PushGatewayError::Transport { message } => {
            Error::service_unavailable(format!("push gateway unavailable: {message}"))
        }
        PushGatewayError::Rejected { message } | PushGatewayError::EndpointDisabled { message } => {
            Error::internal(format!("push gateway error: {message}"))
        }
    }
}

/// Push fan-out over a [`PushGateway`].
#[derive(Clone)]
pub struct NotificationFanoutService<G, P> {
    gateway: Arc<G>,
    tokens: Arc<P>,
    config: FanoutConfig,
}

impl<G, P> NotificationFanoutService<G, P> {
    /// Create the service.
    pub fn new(gateway: Arc<G>, tokens: Arc<P>, config: FanoutConfig) -> Self {
        Self {
            gateway,
            tokens,
            config,
        }
    }

    /// Broadcast topic configured for this engine.
    #[must_use]
    pub const fn topic_arn(&self) -> &TopicArn {
        &self.config.topic_arn
    }
}

impl<G, P> NotificationFanoutService<G, P>
where
    G: PushGateway,
    P: PushTokenRepository,
{
    /// Publish one message for `publication` to `topic`.
    pub async fn publish_to_topic(
        &self,
        topic: &TopicArn,
        publication: &EventPublication,
    ) -> Result<(), Error> {
        let message = build_event_message(publication)?;
        let request = PublishRequest::try_new(Some(topic.clone()), None, message)?;
        self.gateway
            .publish(&request)
            .await
            .map_err(map_gateway_error)?;
        info!(event_id = %publication.event.id, topic = %topic, "event published to topic");
        Ok(())
    }

    /// Publish `publication` to every enabled endpoint subscribed to `city`.
    ///
    /// Disabled endpoints never abort the batch. The first other failure is
    /// returned once the batch has finished and the disabled tokens are stored.
    pub async fn publish_to_city(
        &self,
        publication: &EventPublication,
        city: &EventCity,
    ) -> Result<FanoutReport, Error> {
        let endpoints = self
            .tokens
            .enabled_endpoints_for_city(&city.id)
            .await
            .map_err(map_push_token_error)?;
        let message = build_event_message(publication)?;
        let limit = self.config.concurrency_limit.max(1);

        let outcomes: Vec<_> = stream::iter(endpoints)
            .map(|endpoint| {
                let request = PublishRequest::to_target(endpoint.endpoint_arn, message.clone());
                async move { (endpoint.token_id, self.gateway.publish(&request).await) }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut report = FanoutReport::default();
        let mut failure = None;
        for (token_id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(PushGatewayError::EndpointDisabled { message }) => {
                    warn!(token_id = %token_id, %message, "push endpoint disabled");
                    report.disabled.push(token_id);
                }
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        if !report.disabled.is_empty() {
            let count = self
                .tokens
                .disable(&report.disabled)
                .await
                .map_err(map_push_token_error)?;
            warn!(city_id = %city.id, count, "disabled push tokens with dead endpoints");
        }
        if let Some(err) = failure {
            return Err(map_gateway_error(err));
        }
        info!(
            event_id = %publication.event.id,
            city_id = %city.id,
            delivered = report.delivered,
            "event published to city"
        );
        Ok(report)
    }

    /// Register a device token with the platform application matching it.
    pub async fn generate_platform_endpoint_arn(
        &self,
        token: &str,
        device_id: Option<&str>,
    ) -> Result<EndpointArn, Error> {
        let application = match PushPlatform::for_device(device_id) {
            PushPlatform::Android => &self.config.android_application_arn,
            PushPlatform::Ios => &self.config.ios_application_arn,
        };
        let endpoint = self
            .gateway
            .create_platform_endpoint(application, token)
            .await
            .map_err(map_gateway_error)?;
        info!(endpoint = %endpoint, "platform endpoint created");
        Ok(endpoint)
    }

    /// Subscribe an endpoint to the broadcast topic.
    pub async fn subscribe_to_topic(
        &self,
        endpoint: &EndpointArn,
    ) -> Result<SubscriptionArn, Error> {
        let subscription = self
            .gateway
            .subscribe(&self.config.topic_arn, endpoint)
            .await
            .map_err(map_gateway_error)?;
        info!(endpoint = %endpoint, subscription = %subscription, "endpoint subscribed to topic");
        Ok(subscription)
    }

    /// Remove a topic subscription.
    pub async fn unsubscribe_from_topic(
        &self,
        subscription: &SubscriptionArn,
    ) -> Result<(), Error> {
        self.gateway
            .unsubscribe(subscription)
            .await
            .map_err(map_gateway_error)?;
        info!(subscription = %subscription, "topic subscription removed");
        Ok(())
    }

    /// Re-enable an endpoint the provider had switched off.
    pub async fn enable_endpoint(&self, endpoint: &EndpointArn) -> Result<(), Error> {
        self.gateway
            .set_endpoint_enabled(endpoint, true)
            .await
            .map_err(map_gateway_error)?;
        info!(endpoint = %endpoint, "endpoint enabled");
        Ok(())
    }
}

#[async_trait]
impl<G, P> EventNotifier for NotificationFanoutService<G, P>
where
    G: PushGateway,
    P: PushTokenRepository,
{
    async fn event_published(&self, publication: &EventPublication) -> Result<(), Error> {
        match &publication.city {
            None => self.publish_to_topic(&self.config.topic_arn, publication).await,
            Some(city) => self.publish_to_city(publication, city).await.map(|_| ()),
        }
    }
}

#[cfg(test)]
#[path = "notification_fanout_tests.rs"]
mod tests;
