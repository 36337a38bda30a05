//! Port for the push notification provider.
//!
//! Mirrors the subset of a topic/endpoint push service the fan-out needs.
//! Adapters must report a permanently disabled endpoint as
//! [`PushGatewayError::EndpointDisabled`] so callers can retire it.

use async_trait::async_trait;

use crate::domain::{
    EndpointArn, PlatformApplicationArn, PublishRequest, SubscriptionArn, TopicArn,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by push gateway adapters.
    pub enum PushGatewayError {
        /// The target endpoint can no longer receive messages.
        EndpointDisabled { message: String } =>
            "push endpoint disabled: {message}",
        /// The provider rejected the call.
        Rejected { message: String } =>
            "push gateway rejected request: {message}",
        /// The provider could not be reached or answered garbage.
        Transport { message: String } =>
            "push gateway transport failed: {message}",
    }
}

/// Push provider operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Register a device token under a platform application.
    async fn create_platform_endpoint(
        &self,
        application: &PlatformApplicationArn,
        token: &str,
    ) -> Result<EndpointArn, PushGatewayError>;

    /// Subscribe an endpoint to a topic.
    async fn subscribe(
        &self,
        topic: &TopicArn,
        endpoint: &EndpointArn,
    ) -> Result<SubscriptionArn, PushGatewayError>;

    /// Remove a topic subscription.
    async fn unsubscribe(&self, subscription: &SubscriptionArn) -> Result<(), PushGatewayError>;

    /// Publish one message to a topic or an endpoint.
    async fn publish(&self, request: &PublishRequest) -> Result<(), PushGatewayError>;

    /// Set the endpoint's `Enabled` attribute.
    async fn set_endpoint_enabled(
        &self,
        endpoint: &EndpointArn,
        enabled: bool,
    ) -> Result<(), PushGatewayError>;
}
