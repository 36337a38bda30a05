//! Bearer-token authentication for HTTP handlers.
//!
//! [`AuthContext`] is an extractor: handlers that take it are only invoked
//! once the `Authorization: Bearer <token>` header has been verified through
//! the [`AccessTokenVerifier`](crate::domain::ports::AccessTokenVerifier)
//! held in [`HttpState`].

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::ports::AccessTokenError;
use crate::domain::{Error, User, UserId};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthContext(User);

impl AuthContext {
    /// The caller's identifier.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.0.id
    }

    /// Whether the caller holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }

    /// Fail with `403 Forbidden` unless the caller is an admin.
    pub fn require_admin(&self) -> Result<&UserId, Error> {
        if self.is_admin() {
            Ok(self.user_id())
        } else {
            Err(Error::forbidden("admin role required"))
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid ASCII"))?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))
}

fn authenticate(req: &HttpRequest) -> Result<AuthContext, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
    let token = bearer_token(req)?;
    let user = state.tokens.verify(token).map_err(|err| {
        debug!(error = %err, "bearer token refused");
        match err {
            AccessTokenError::Expired => Error::access_token_expired("access token expired"),
            AccessTokenError::Invalid { .. } => Error::unauthorized("invalid access token"),
        }
    })?;
    Ok(AuthContext(user))
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, UserRole};
    use crate::test_support::TestHarness;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use rstest::rstest;

    async fn admin_only(auth: AuthContext) -> Result<HttpResponse, Error> {
        let id = auth.require_admin()?;
        Ok(HttpResponse::Ok().body(id.to_string()))
    }

    async fn call(header: Option<&str>) -> (StatusCode, String) {
        let harness = TestHarness::default();
        let admin = harness.grant("admin-token", UserRole::Admin);
        harness.grant("user-token", UserRole::User);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(harness.http_state()))
                .route("/", web::get().to(admin_only)),
        )
        .await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        let body = String::from_utf8(body.to_vec()).expect("utf8 body");
        if status.is_success() {
            assert_eq!(body, admin.to_string());
        }
        (status, body)
    }

    #[actix_web::test]
    async fn admins_pass_the_role_check() {
        let (status, _) = call(Some("Bearer admin-token")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[rstest]
    #[case::missing(None, StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)]
    #[case::wrong_scheme(Some("Basic abc"), StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)]
    #[case::empty(Some("Bearer   "), StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)]
    #[case::unknown(Some("Bearer nope"), StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)]
    #[case::expired(
        Some("Bearer expired"),
        StatusCode::PRECONDITION_FAILED,
        ErrorCode::AccessTokenExpired
    )]
    #[case::not_admin(Some("Bearer user-token"), StatusCode::FORBIDDEN, ErrorCode::Forbidden)]
    #[actix_web::test]
    async fn refusals_map_to_codes(
        #[case] header: Option<&str>,
        #[case] status: StatusCode,
        #[case] code: ErrorCode,
    ) {
        let (actual, body) = call(header).await;
        assert_eq!(actual, status);
        let error: Error = serde_json::from_str(&body).expect("error body");
        assert_eq!(error.code(), code);
    }
}
