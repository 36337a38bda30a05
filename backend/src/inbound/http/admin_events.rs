//! Back-office event management.
//!
//! ```text
//! GET    /api/v1/admin/events?cityId=
//! GET    /api/v1/admin/events/{id}
//! POST   /api/v1/admin/events
//! PATCH  /api/v1/admin/events/{id}
//! DELETE /api/v1/admin/events/{id}
//! ```
//!
//! Creating an event, or moving it to another city, broadcasts a push
//! notification after the row is stored.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{CityId, Error, EventId, EventLink, EventPatch, NewEvent};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::event_dto::{AdminEventResponse, EventLinkDto, admin_event_list};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, blank_to_none, double_option, missing_field_error, parse_optional_rfc3339_timestamp,
    parse_rfc3339_timestamp, parse_uuid, require_text,
};

/// Optional city filter for the admin listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AdminEventListQuery {
    /// Only events held in this city.
    pub city_id: Option<String>,
}

/// Request payload for creating an event.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    /// RFC 3339; must not fall on a past day.
    pub start_date: Option<String>,
    /// RFC 3339; must follow `startDate`.
    pub end_date: Option<String>,
    /// Omit for a global event.
    pub city_id: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<EventLinkDto>,
}

/// Partial event update. `null` clears nullable fields.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// A different city republishes the event; `null` makes it global.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub city_id: Option<Option<String>>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<EventLinkDto>)]
    pub link: Option<Option<EventLinkDto>>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(FieldName::new(field)))
}

fn parse_city_id(raw: &str) -> Result<CityId, Error> {
    parse_uuid(raw, FieldName::new("cityId")).map(CityId::from)
}

fn parse_link(link: EventLinkDto) -> Result<EventLink, Error> {
    Ok(EventLink {
        text: require_text(link.text, FieldName::new("link.text"))?,
        url: require_text(link.url, FieldName::new("link.url"))?,
    })
}

fn parse_create_request(payload: CreateEventRequest) -> Result<NewEvent, Error> {
    let start = required(payload.start_date, "startDate")?;
    let end = required(payload.end_date, "endDate")?;
    Ok(NewEvent {
        name: require_text(required(payload.name, "name")?, FieldName::new("name"))?,
        description: require_text(
            required(payload.description, "description")?,
            FieldName::new("description"),
        )?,
        start_date: parse_rfc3339_timestamp(&start, FieldName::new("startDate"))?,
        end_date: parse_rfc3339_timestamp(&end, FieldName::new("endDate"))?,
        city_id: payload.city_id.as_deref().map(parse_city_id).transpose()?,
        location: require_text(
            required(payload.location, "location")?,
            FieldName::new("location"),
        )?,
        image_url: blank_to_none(payload.image_url),
        link: payload.link.map(parse_link).transpose()?,
    })
}

fn parse_update_request(payload: UpdateEventRequest) -> Result<EventPatch, Error> {
    let text = |value: Option<String>, field: &'static str| {
        value
            .map(|raw| require_text(raw, FieldName::new(field)))
            .transpose()
    };
    Ok(EventPatch {
        name: text(payload.name, "name")?,
        description: text(payload.description, "description")?,
        start_date: parse_optional_rfc3339_timestamp(
            payload.start_date.as_deref(),
            FieldName::new("startDate"),
        )?,
        end_date: parse_optional_rfc3339_timestamp(
            payload.end_date.as_deref(),
            FieldName::new("endDate"),
        )?,
        city_id: payload
            .city_id
            .map(|city| city.as_deref().map(parse_city_id).transpose())
            .transpose()?,
        location: text(payload.location, "location")?,
        image_url: payload.image_url.map(blank_to_none),
        link: payload
            .link
            .map(|link| link.map(parse_link).transpose())
            .transpose()?,
    })
}

fn event_id(raw: &str) -> Result<EventId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(EventId::from)
}

/// Events with attendance aggregates, newest start first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/events",
    params(AdminEventListQuery),
    responses(
        (status = 200, description = "Events", body = [AdminEventResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown city", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminListEvents"
)]
#[get("/admin/events")]
pub async fn list_events(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<AdminEventListQuery>,
) -> ApiResult<web::Json<Vec<AdminEventResponse>>> {
    auth.require_admin()?;
    let events = match query.city_id.as_deref() {
        Some(raw) => {
            let city_id = parse_city_id(raw)?;
            state.events_query.get_all_in_city(&city_id).await?
        }
        None => state.events_query.get_all().await?,
    };
    Ok(web::Json(admin_event_list(events)))
}

/// One event with aggregates.
#[utoipa::path(
    get,
    path = "/api/v1/admin/events/{id}",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Event", body = AdminEventResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminGetEvent"
)]
#[get("/admin/events/{id}")]
pub async fn get_event(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<AdminEventResponse>> {
    auth.require_admin()?;
    let event = state.events_query.get_by_id(&event_id(&path)?).await?;
    Ok(web::Json(AdminEventResponse::from(event)))
}

/// Create an event and notify riders.
#[utoipa::path(
    post,
    path = "/api/v1/admin/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "All events after the change", body = [AdminEventResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown city", body = ErrorSchema),
        (status = 409, description = "Duplicate event", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminCreateEvent"
)]
#[post("/admin/events")]
pub async fn create_event(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateEventRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let events = state
        .events
        .register(parse_create_request(payload.into_inner())?)
        .await?;
    Ok(HttpResponse::Created().json(admin_event_list(events)))
}

/// Patch an event; a city change republishes it.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/events/{id}",
    params(("id" = String, Path, description = "Event identifier")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = AdminEventResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Duplicate event", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateEvent"
)]
#[patch("/admin/events/{id}")]
pub async fn update_event(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: web::Json<UpdateEventRequest>,
) -> ApiResult<web::Json<AdminEventResponse>> {
    auth.require_admin()?;
    let id = event_id(&path)?;
    let patch = parse_update_request(payload.into_inner())?;
    let event = state.events.update(&id, patch).await?;
    Ok(web::Json(AdminEventResponse::from(event)))
}

/// Delete an event with its registrations and read state.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/events/{id}",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Remaining events", body = [AdminEventResponse]),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteEvent"
)]
#[delete("/admin/events/{id}")]
pub async fn delete_event(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<AdminEventResponse>>> {
    auth.require_admin()?;
    let events = state.events.remove(&event_id(&path)?).await?;
    Ok(web::Json(admin_event_list(events)))
}
