//! Test helpers for inbound HTTP components.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use serde::Serialize;

use crate::Trace;
use crate::domain::UserRole;
use crate::inbound::http::configure_api;
use crate::test_support::TestHarness;

/// Bearer token granted to the regular user of [`seeded_harness`].
pub const USER_TOKEN: &str = "user-token";
/// Bearer token granted to the admin of [`seeded_harness`].
pub const ADMIN_TOKEN: &str = "admin-token";

/// Harness with one regular user and one admin.
pub fn seeded_harness() -> TestHarness {
    let harness = TestHarness::default();
    harness.grant(USER_TOKEN, UserRole::User);
    harness.grant(ADMIN_TOKEN, UserRole::Admin);
    harness
}

/// The full `/api/v1` surface over `harness`.
pub fn api_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::new(harness.http_state()))
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
}

/// Build an authenticated request.
pub fn authed(method: Method, uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::default()
        .method(method)
        .uri(uri)
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

/// Build an authenticated JSON request.
pub fn authed_json(
    method: Method,
    uri: &str,
    token: &str,
    body: &impl Serialize,
) -> test::TestRequest {
    authed(method, uri, token).set_json(body)
}
