//! Device push token registration.
//!
//! ```text
//! POST   /api/v1/push-tokens
//! DELETE /api/v1/push-tokens/{id}
//! ```

use actix_web::{HttpResponse, delete, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::PushTokenRegistration;
use crate::domain::{Error, PushToken, PushTokenId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, blank_to_none, missing_field_error, parse_uuid, require_text,
};

/// Request payload for registering a device.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRequest {
    /// Provider token issued to the app.
    pub token: Option<String>,
    /// Android device id. iOS clients omit it.
    pub device_id: Option<String>,
}

/// A registered device token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenResponse {
    pub id: String,
    pub token: String,
    pub device_id: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PushToken> for PushTokenResponse {
    fn from(value: PushToken) -> Self {
        Self {
            id: value.id.to_string(),
            token: value.token,
            device_id: value.device_id,
            enabled: value.enabled,
            created_at: value.created_at,
        }
    }
}

fn parse_registration(payload: PushTokenRequest) -> Result<PushTokenRegistration, Error> {
    let field = FieldName::new("token");
    let token = payload.token.ok_or_else(|| missing_field_error(field))?;
    Ok(PushTokenRegistration {
        token: require_text(token, field)?,
        device_id: blank_to_none(payload.device_id),
    })
}

/// Register the caller's device and subscribe it to event broadcasts.
#[utoipa::path(
    post,
    path = "/api/v1/push-tokens",
    request_body = PushTokenRequest,
    responses(
        (status = 201, description = "Registered token", body = PushTokenResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Token owned by another user", body = ErrorSchema),
        (status = 503, description = "Push gateway unavailable", body = ErrorSchema)
    ),
    tags = ["push"],
    operation_id = "registerPushToken"
)]
#[post("/push-tokens")]
pub async fn register_token(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<PushTokenRequest>,
) -> ApiResult<HttpResponse> {
    let registration = parse_registration(payload.into_inner())?;
    let token = state
        .push_tokens
        .register_token(auth.user_id(), registration)
        .await?;
    Ok(HttpResponse::Created().json(PushTokenResponse::from(token)))
}

/// Retire one of the caller's devices.
#[utoipa::path(
    delete,
    path = "/api/v1/push-tokens/{id}",
    params(("id" = String, Path, description = "Push token identifier")),
    responses(
        (status = 204, description = "Token removed"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Token owned by another user", body = ErrorSchema),
        (status = 404, description = "Unknown token", body = ErrorSchema)
    ),
    tags = ["push"],
    operation_id = "removePushToken"
)]
#[delete("/push-tokens/{id}")]
pub async fn remove_token(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = PushTokenId::from(parse_uuid(&path, FieldName::new("id"))?);
    state.push_tokens.remove_token(auth.user_id(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{
        ADMIN_TOKEN, USER_TOKEN, api_app, authed, authed_json, seeded_harness,
    };
    use actix_web::http::{Method, StatusCode};
    use actix_web::test::{self};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn blank_device_id_means_ios() {
        let registration = parse_registration(PushTokenRequest {
            token: Some(" abc ".to_owned()),
            device_id: Some("  ".to_owned()),
        })
        .expect("registration");
        assert_eq!(registration.token, "abc");
        assert_eq!(registration.device_id, None);
    }

    #[actix_web::test]
    async fn registering_subscribes_the_endpoint_to_the_topic() {
        let harness = seeded_harness();
        let app = test::init_service(api_app(&harness)).await;

        let request = authed_json(
            Method::POST,
            "/api/v1/push-tokens",
            USER_TOKEN,
            &json!({ "token": "fcm-1", "deviceId": "pixel" }),
        )
        .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: PushTokenResponse = test::read_body_json(response).await;
        assert!(body.enabled);
        assert_eq!(body.device_id.as_deref(), Some("pixel"));
        assert_eq!(harness.gateway.subscribed().len(), 1);
    }

    #[actix_web::test]
    async fn removing_someone_elses_token_is_forbidden() {
        let harness = seeded_harness();
        let app = test::init_service(api_app(&harness)).await;

        let request = authed_json(
            Method::POST,
            "/api/v1/push-tokens",
            USER_TOKEN,
            &json!({ "token": "apns-1" }),
        )
        .to_request();
        let created: PushTokenResponse =
            test::read_body_json(test::call_service(&app, request).await).await;

        let uri = format!("/api/v1/push-tokens/{}", created.id);
        let request = authed(Method::DELETE, &uri, ADMIN_TOKEN).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = authed(Method::DELETE, &uri, USER_TOKEN).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
