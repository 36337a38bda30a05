//! Reqwest-backed push relay adapter.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and recognising permanently disabled endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{
    CreatePlatformEndpointRequest, CreatePlatformEndpointResponse, EndpointAttributes,
    PublishRequestDto, RelayErrorDto, SetEndpointAttributesRequest, SubscribeRequest,
    SubscribeResponse, UnsubscribeRequest,
};
use crate::domain::ports::{PushGateway, PushGatewayError};
use crate::domain::{
    EndpointArn, PlatformApplicationArn, PublishRequest, SubscriptionArn, TopicArn,
};

const DEFAULT_USER_AGENT: &str = "fleet-backend-push/0.1";
const ENDPOINT_DISABLED_CODE: &str = "EndpointDisabled";

/// Outbound identity sent to the relay.
pub struct PushRelayIdentity {
    /// HTTP user-agent sent to the relay.
    pub user_agent: String,
    /// Optional bearer token the relay expects.
    pub api_key: Option<String>,
}

impl Default for PushRelayIdentity {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            api_key: None,
        }
    }
}

/// Push gateway that POSTs one JSON document per provider action.
pub struct HttpPushGateway {
    client: Client,
    base_url: Url,
    user_agent: String,
    api_key: Option<String>,
}

impl HttpPushGateway {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_identity(base_url, timeout, PushRelayIdentity::default())
    }

    /// Build an adapter with explicit outbound identity.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_identity(
        base_url: Url,
        timeout: Duration,
        identity: PushRelayIdentity,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            user_agent: identity.user_agent,
            api_key: identity.api_key,
        })
    }

    fn action_url(&self, action: &str) -> Result<Url, PushGatewayError> {
        self.base_url
            .join(action)
            .map_err(|err| PushGatewayError::transport(format!("invalid relay url: {err}")))
    }

    async fn call(&self, action: &str, body: &impl Serialize) -> Result<Vec<u8>, PushGatewayError> {
        let url = self.action_url(action)?;
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        debug!(action, status = status.as_u16(), "push relay responded");
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        Ok(bytes.to_vec())
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        action: &str,
        body: &impl Serialize,
    ) -> Result<T, PushGatewayError> {
        let bytes = self.call(action, body).await?;
        decode(&bytes)
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn create_platform_endpoint(
        &self,
        application: &PlatformApplicationArn,
        token: &str,
    ) -> Result<EndpointArn, PushGatewayError> {
        let response: CreatePlatformEndpointResponse = self
            .call_json(
                "CreatePlatformEndpoint",
                &CreatePlatformEndpointRequest {
                    platform_application_arn: application.as_str(),
                    token,
                },
            )
            .await?;
        Ok(EndpointArn::new(response.endpoint_arn))
    }

    async fn subscribe(
        &self,
        topic: &TopicArn,
        endpoint: &EndpointArn,
    ) -> Result<SubscriptionArn, PushGatewayError> {
        let response: SubscribeResponse = self
            .call_json(
                "Subscribe",
                &SubscribeRequest {
                    topic_arn: topic.as_str(),
                    protocol: "application",
                    endpoint: endpoint.as_str(),
                },
            )
            .await?;
        Ok(SubscriptionArn::new(response.subscription_arn))
    }

    async fn unsubscribe(&self, subscription: &SubscriptionArn) -> Result<(), PushGatewayError> {
        self.call(
            "Unsubscribe",
            &UnsubscribeRequest {
                subscription_arn: subscription.as_str(),
            },
        )
        .await
        .map(|_| ())
    }

    async fn publish(&self, request: &PublishRequest) -> Result<(), PushGatewayError> {
        self.call("Publish", &publish_body(request)).await.map(|_| ())
    }

    async fn set_endpoint_enabled(
        &self,
        endpoint: &EndpointArn,
        enabled: bool,
    ) -> Result<(), PushGatewayError> {
        self.call(
            "SetEndpointAttributes",
            &SetEndpointAttributesRequest {
                endpoint_arn: endpoint.as_str(),
                attributes: EndpointAttributes {
                    enabled: enabled.to_string(),
                },
            },
        )
        .await
        .map(|_| ())
    }
}

fn publish_body(request: &PublishRequest) -> PublishRequestDto<'_> {
    PublishRequestDto {
        topic_arn: request.topic_arn().map(TopicArn::as_str),
        target_arn: request.target_arn().map(EndpointArn::as_str),
        message: request.message(),
        message_structure: "json",
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, PushGatewayError> {
    serde_json::from_slice(body).map_err(|error| {
        PushGatewayError::transport(format!("invalid relay JSON payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> PushGatewayError {
    PushGatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PushGatewayError {
    let envelope: RelayErrorDto = serde_json::from_slice(body).unwrap_or_default();
    let detail = envelope.message.unwrap_or_else(|| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {detail}", status.as_u16())
    };

    if status == StatusCode::GONE || envelope.code.as_deref() == Some(ENDPOINT_DISABLED_CODE) {
        return PushGatewayError::endpoint_disabled(message);
    }
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        PushGatewayError::rejected(message)
    } else {
        PushGatewayError::transport(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
