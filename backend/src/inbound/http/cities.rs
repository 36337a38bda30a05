//! City discovery and subscription handlers.
//!
//! ```text
//! GET    /api/v1/cities?lat&long
//! GET    /api/v1/cities/location?long&lat
//! GET    /api/v1/cities/subscriptions
//! POST   /api/v1/cities/subscriptions
//! DELETE /api/v1/cities/subscriptions/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{City, CityId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_geo_point, parse_optional_geo_point, parse_uuid,
};

/// City as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Catchment radius in metres.
    pub radius: u32,
    /// IANA timezone.
    pub timezone: String,
    pub image_url: Option<String>,
}

impl From<City> for CityResponse {
    fn from(value: City) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            longitude: value.location.longitude(),
            latitude: value.location.latitude(),
            radius: value.radius_m,
            timezone: value.timezone,
            image_url: value.image_url,
        }
    }
}

pub(crate) fn city_list(cities: Vec<City>) -> Vec<CityResponse> {
    cities.into_iter().map(CityResponse::from).collect()
}

/// Optional origin used to order candidate cities by distance.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CityListQuery {
    /// Latitude of the caller.
    pub lat: Option<f64>,
    /// Longitude of the caller.
    pub long: Option<f64>,
}

/// Point to resolve to a city.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CityLocationQuery {
    pub long: Option<f64>,
    pub lat: Option<f64>,
}

/// Request payload for subscribing to a city.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub city_id: Option<String>,
}

/// List cities the caller may still subscribe to.
#[utoipa::path(
    get,
    path = "/api/v1/cities",
    params(CityListQuery),
    description = "Unsubscribed cities, by distance when a position is given, otherwise by name.",
    responses(
        (status = 200, description = "Candidate cities", body = [CityResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["cities"],
    operation_id = "listSubscribableCities"
)]
#[get("/cities")]
pub async fn list_cities(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<CityListQuery>,
) -> ApiResult<web::Json<Vec<CityResponse>>> {
    let CityListQuery { lat, long } = query.into_inner();
    let origin = parse_optional_geo_point(long, lat)?;
    let cities = state
        .cities_query
        .possible_cities_to_subscribe(auth.user_id(), auth.is_admin(), origin)
        .await?;
    Ok(web::Json(city_list(cities)))
}

/// Resolve a position to the nearest city containing it.
#[utoipa::path(
    get,
    path = "/api/v1/cities/location",
    params(CityLocationQuery),
    responses(
        (status = 200, description = "Containing city, or null", body = Option<CityResponse>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["cities"],
    operation_id = "getCityAtLocation"
)]
#[get("/cities/location")]
pub async fn city_at_location(
    state: web::Data<HttpState>,
    _auth: AuthContext,
    query: web::Query<CityLocationQuery>,
) -> ApiResult<web::Json<Option<CityResponse>>> {
    let CityLocationQuery { long, lat } = query.into_inner();
    let long = long.ok_or_else(|| missing_field_error(FieldName::new("long")))?;
    let lat = lat.ok_or_else(|| missing_field_error(FieldName::new("lat")))?;
    let city = state.cities_query.city_at(parse_geo_point(long, lat)?).await?;
    Ok(web::Json(city.map(CityResponse::from)))
}

/// Cities the caller is subscribed to.
#[utoipa::path(
    get,
    path = "/api/v1/cities/subscriptions",
    responses(
        (status = 200, description = "Subscribed cities", body = [CityResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["cities"],
    operation_id = "listSubscribedCities"
)]
#[get("/cities/subscriptions")]
pub async fn list_subscriptions(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<Vec<CityResponse>>> {
    let cities = state
        .subscriptions_query
        .subscribed_cities(auth.user_id())
        .await?;
    Ok(web::Json(city_list(cities)))
}

/// Subscribe the caller to a city.
#[utoipa::path(
    post,
    path = "/api/v1/cities/subscriptions",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribed cities after the change", body = [CityResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown city", body = ErrorSchema),
        (status = 409, description = "Already subscribed", body = ErrorSchema)
    ),
    tags = ["cities"],
    operation_id = "subscribeToCity"
)]
#[post("/cities/subscriptions")]
pub async fn subscribe(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<SubscribeRequest>,
) -> ApiResult<HttpResponse> {
    let field = FieldName::new("cityId");
    let raw = payload
        .into_inner()
        .city_id
        .ok_or_else(|| missing_field_error(field))?;
    let city_id = CityId::from(parse_uuid(&raw, field)?);
    let cities = state.subscriptions.subscribe(auth.user_id(), &city_id).await?;
    Ok(HttpResponse::Created().json(city_list(cities)))
}

/// Remove the caller's subscription to a city.
#[utoipa::path(
    delete,
    path = "/api/v1/cities/subscriptions/{id}",
    params(("id" = String, Path, description = "City identifier")),
    responses(
        (status = 200, description = "Subscribed cities after the change", body = [CityResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not subscribed", body = ErrorSchema)
    ),
    tags = ["cities"],
    operation_id = "unsubscribeFromCity"
)]
#[delete("/cities/subscriptions/{id}")]
pub async fn unsubscribe(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CityResponse>>> {
    let city_id = CityId::from(parse_uuid(&path.into_inner(), FieldName::new("id"))?);
    let cities = state
        .subscriptions
        .unsubscribe(auth.user_id(), &city_id)
        .await?;
    Ok(web::Json(city_list(cities)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, GeoPoint};
    use crate::inbound::http::test_utils::{
        USER_TOKEN, api_app, authed, authed_json, seeded_harness,
    };
    use crate::test_support::TestHarness;
    use actix_web::http::{Method, StatusCode};
    use actix_web::test;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    fn city(name: &str, longitude: f64, latitude: f64) -> City {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("timestamp");
        City {
            id: CityId::from(Uuid::new_v4()),
            name: name.to_owned(),
            location: GeoPoint::new(longitude, latitude).expect("point"),
            radius_m: 15_000,
            timezone: "Europe/Prague".to_owned(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn seeded() -> (TestHarness, City, City) {
        let harness = seeded_harness();
        let prague = city("Prague", 14.42076, 50.08804);
        let brno = city("Brno", 16.60796, 49.19522);
        harness.store.add_city(prague.clone());
        harness.store.add_city(brno.clone());
        (harness, prague, brno)
    }

    #[actix_web::test]
    async fn lists_candidates_by_distance_when_a_position_is_given() {
        let (harness, _, _) = seeded();
        let app = test::init_service(api_app(&harness)).await;
        let req = authed(Method::GET, "/api/v1/cities?lat=49.2&long=16.6", USER_TOKEN);
        let body: Vec<CityResponse> = test::call_and_read_body_json(&app, req.to_request()).await;
        let names: Vec<_> = body.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Brno", "Prague"]);
    }

    #[rstest]
    #[case("/api/v1/cities?lat=49.2")]
    #[case("/api/v1/cities/location?long=14.4")]
    #[case("/api/v1/cities/location?long=14.4&lat=95")]
    #[actix_web::test]
    async fn incomplete_positions_are_rejected(#[case] uri: &str) {
        let (harness, _, _) = seeded();
        let app = test::init_service(api_app(&harness)).await;
        let res = test::call_service(&app, authed(Method::GET, uri, USER_TOKEN).to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn location_outside_every_city_is_null() {
        let (harness, _, _) = seeded();
        let app = test::init_service(api_app(&harness)).await;
        let req = authed(Method::GET, "/api/v1/cities/location?long=0&lat=0", USER_TOKEN);
        let body: Option<CityResponse> =
            test::call_and_read_body_json(&app, req.to_request()).await;
        assert!(body.is_none());
    }

    #[actix_web::test]
    async fn subscribe_then_unsubscribe_round_trips_the_list() {
        let (harness, prague, _) = seeded();
        let app = test::init_service(api_app(&harness)).await;

        let req = authed_json(
            Method::POST,
            "/api/v1/cities/subscriptions",
            USER_TOKEN,
            &json!({ "cityId": prague.id.to_string() }),
        );
        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Vec<CityResponse> = test::read_body_json(res).await;
        assert_eq!(body.len(), 1);

        let again = authed_json(
            Method::POST,
            "/api/v1/cities/subscriptions",
            USER_TOKEN,
            &json!({ "cityId": prague.id.to_string() }),
        );
        let res = test::call_service(&app, again.to_request()).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let uri = format!("/api/v1/cities/subscriptions/{}", prague.id);
        let res = test::call_service(&app, authed(Method::DELETE, &uri, USER_TOKEN).to_request())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Vec<CityResponse> = test::read_body_json(res).await;
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn subscribe_requires_a_city_id() {
        let (harness, _, _) = seeded();
        let app = test::init_service(api_app(&harness)).await;
        let req = authed_json(Method::POST, "/api/v1/cities/subscriptions", USER_TOKEN, &json!({}));
        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err: crate::domain::Error = test::read_body_json(res).await;
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
