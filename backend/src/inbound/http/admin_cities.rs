//! Back-office city management.
//!
//! ```text
//! GET    /api/v1/admin/cities
//! GET    /api/v1/admin/cities/summary
//! GET    /api/v1/admin/cities/{id}
//! POST   /api/v1/admin/cities
//! PATCH  /api/v1/admin/cities/{id}
//! DELETE /api/v1/admin/cities/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CityId, CityPatch, CitySubscriptionSummary, Error, NewCity};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::cities::{CityResponse, city_list};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, blank_to_none, double_option, invalid_value_error, missing_field_error,
    parse_geo_point, parse_optional_geo_point, parse_uuid, require_text,
};

/// Request payload for registering a city.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCityRequest {
    pub name: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Radius in metres; the configured default applies when omitted.
    pub radius: Option<u32>,
    pub image_url: Option<String>,
}

/// Partial city update. The timezone is fixed at registration.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCityRequest {
    pub name: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub radius: Option<u32>,
    /// `null` clears the image.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

/// A city with its active subscriber count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CitySummaryResponse {
    #[serde(flatten)]
    pub city: CityResponse,
    pub subscriber_count: u64,
}

impl From<CitySubscriptionSummary> for CitySummaryResponse {
    fn from(value: CitySubscriptionSummary) -> Self {
        Self {
            city: CityResponse::from(value.city),
            subscriber_count: value.subscriber_count,
        }
    }
}

fn parse_radius(radius: Option<u32>) -> Result<Option<u32>, Error> {
    match radius {
        Some(0) => Err(invalid_value_error(
            FieldName::new("radius"),
            "radius must be positive",
            "0",
        )),
        other => Ok(other),
    }
}

fn parse_create_request(payload: CreateCityRequest) -> Result<NewCity, Error> {
    let name = payload
        .name
        .ok_or_else(|| missing_field_error(FieldName::new("name")))?;
    let longitude = payload
        .longitude
        .ok_or_else(|| missing_field_error(FieldName::new("longitude")))?;
    let latitude = payload
        .latitude
        .ok_or_else(|| missing_field_error(FieldName::new("latitude")))?;
    Ok(NewCity {
        name: require_text(name, FieldName::new("name"))?,
        location: parse_geo_point(longitude, latitude)?,
        radius_m: parse_radius(payload.radius)?,
        image_url: blank_to_none(payload.image_url),
    })
}

fn parse_update_request(payload: UpdateCityRequest) -> Result<CityPatch, Error> {
    Ok(CityPatch {
        name: payload
            .name
            .map(|name| require_text(name, FieldName::new("name")))
            .transpose()?,
        location: parse_optional_geo_point(payload.longitude, payload.latitude)?,
        radius_m: parse_radius(payload.radius)?,
        image_url: payload.image_url.map(blank_to_none),
    })
}

fn city_id(raw: &str) -> Result<CityId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(CityId::from)
}

/// Every city, the test city included.
#[utoipa::path(
    get,
    path = "/api/v1/admin/cities",
    responses(
        (status = 200, description = "All cities", body = [CityResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminListCities"
)]
#[get("/admin/cities")]
pub async fn list_cities(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<Vec<CityResponse>>> {
    auth.require_admin()?;
    let cities = state.cities_query.get_all(true).await?;
    Ok(web::Json(city_list(cities)))
}

/// Subscriber counts per city.
#[utoipa::path(
    get,
    path = "/api/v1/admin/cities/summary",
    responses(
        (status = 200, description = "Cities with subscriber counts", body = [CitySummaryResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminCitySummary"
)]
#[get("/admin/cities/summary")]
pub async fn city_summary(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<Vec<CitySummaryResponse>>> {
    auth.require_admin()?;
    let summaries = state.subscriptions_query.summaries().await?;
    Ok(web::Json(
        summaries
            .into_iter()
            .map(CitySummaryResponse::from)
            .collect(),
    ))
}

/// Fetch one city.
#[utoipa::path(
    get,
    path = "/api/v1/admin/cities/{id}",
    params(("id" = String, Path, description = "City identifier")),
    responses(
        (status = 200, description = "City", body = CityResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminGetCity"
)]
#[get("/admin/cities/{id}")]
pub async fn get_city(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CityResponse>> {
    auth.require_admin()?;
    let city = state.cities_query.get_by_id(&city_id(&path)?).await?;
    Ok(web::Json(CityResponse::from(city)))
}

/// Register a city; its timezone is resolved from the centre point.
#[utoipa::path(
    post,
    path = "/api/v1/admin/cities",
    request_body = CreateCityRequest,
    responses(
        (status = 201, description = "Registered city", body = CityResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 409, description = "Name already taken", body = ErrorSchema),
        (status = 503, description = "Timezone lookup unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminCreateCity"
)]
#[post("/admin/cities")]
pub async fn create_city(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateCityRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let city = state
        .cities
        .register(parse_create_request(payload.into_inner())?)
        .await?;
    Ok(HttpResponse::Created().json(CityResponse::from(city)))
}

/// Patch a city. The test city cannot be modified.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/cities/{id}",
    params(("id" = String, Path, description = "City identifier")),
    request_body = UpdateCityRequest,
    responses(
        (status = 200, description = "Updated city", body = CityResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already taken", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateCity"
)]
#[patch("/admin/cities/{id}")]
pub async fn update_city(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: web::Json<UpdateCityRequest>,
) -> ApiResult<web::Json<CityResponse>> {
    auth.require_admin()?;
    let id = city_id(&path)?;
    let patch = parse_update_request(payload.into_inner())?;
    let city = state.cities.update(&id, patch).await?;
    Ok(web::Json(CityResponse::from(city)))
}

/// Remove a city together with its subscriptions.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/cities/{id}",
    params(("id" = String, Path, description = "City identifier")),
    responses(
        (status = 204, description = "City removed"),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "City still has events", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteCity"
)]
#[delete("/admin/cities/{id}")]
pub async fn delete_city(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    state.cities.remove(&city_id(&path)?).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::{
        ADMIN_TOKEN, USER_TOKEN, api_app, authed, authed_json, seeded_harness,
    };
    use actix_web::http::{Method, StatusCode};
    use actix_web::test::{self};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn create_request_requires_coordinates() {
        let err = parse_create_request(CreateCityRequest {
            name: Some("Prague".to_owned()),
            longitude: Some(14.4),
            latitude: None,
            radius: None,
            image_url: None,
        })
        .expect_err("latitude missing");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn zero_radius_is_rejected() {
        assert!(parse_radius(Some(0)).is_err());
        assert_eq!(parse_radius(Some(500)).expect("radius"), Some(500));
    }

    #[rstest]
    #[case(json!({}), None)]
    #[case(json!({"imageUrl": null}), Some(None))]
    #[case(json!({"imageUrl": "  "}), Some(None))]
    #[case(json!({"imageUrl": "https://img/x.png"}), Some(Some("https://img/x.png".to_owned())))]
    fn image_patch_distinguishes_absent_and_null(
        #[case] body: serde_json::Value,
        #[case] expected: Option<Option<String>>,
    ) {
        let payload: UpdateCityRequest = serde_json::from_value(body).expect("payload");
        let patch = parse_update_request(payload).expect("patch");
        assert_eq!(patch.image_url, expected);
    }

    #[actix_web::test]
    async fn regular_users_are_forbidden() {
        let harness = seeded_harness();
        let app = test::init_service(api_app(&harness)).await;
        let res = test::call_service(
            &app,
            authed(Method::GET, "/api/v1/admin/cities", USER_TOKEN).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn create_defaults_radius_and_resolves_timezone() {
        let harness = seeded_harness();
        let app = test::init_service(api_app(&harness)).await;
        let req = authed_json(
            Method::POST,
            "/api/v1/admin/cities",
            ADMIN_TOKEN,
            &json!({"name": "Prague", "longitude": 14.42076, "latitude": 50.08804}),
        );
        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let city: CityResponse = test::read_body_json(res).await;
        assert_eq!(city.radius, crate::test_support::DEFAULT_RADIUS_M);
        assert_eq!(city.timezone, "UTC");

        let duplicate = authed_json(
            Method::POST,
            "/api/v1/admin/cities",
            ADMIN_TOKEN,
            &json!({"name": "Prague", "longitude": 14.0, "latitude": 50.0}),
        );
        let res = test::call_service(&app, duplicate.to_request()).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn summary_is_not_captured_by_the_id_route() {
        let harness = seeded_harness();
        let app = test::init_service(api_app(&harness)).await;
        let res = test::call_service(
            &app,
            authed(Method::GET, "/api/v1/admin/cities/summary", ADMIN_TOKEN).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_city_cannot_be_deleted() {
        let harness = seeded_harness();
        let app = test::init_service(api_app(&harness)).await;
        let uri = format!("/api/v1/admin/cities/{}", harness.test_city_id);
        let res =
            test::call_service(&app, authed(Method::DELETE, &uri, ADMIN_TOKEN).to_request()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
