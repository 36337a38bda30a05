//! Wire shapes exchanged with the push relay.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct CreatePlatformEndpointRequest<'a> {
    pub platform_application_arn: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct CreatePlatformEndpointResponse {
    pub endpoint_arn: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct SubscribeRequest<'a> {
    pub topic_arn: &'a str,
    pub protocol: &'static str,
    pub endpoint: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct SubscribeResponse {
    pub subscription_arn: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct UnsubscribeRequest<'a> {
    pub subscription_arn: &'a str,
}

/// Exactly one of `topic_arn` and `target_arn` is set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct PublishRequestDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_arn: Option<&'a str>,
    pub message: &'a str,
    pub message_structure: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct EndpointAttributes {
    pub enabled: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct SetEndpointAttributesRequest<'a> {
    pub endpoint_arn: &'a str,
    pub attributes: EndpointAttributes,
}

/// Error envelope returned by the relay on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct RelayErrorDto {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
