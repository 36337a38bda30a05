//! Rider-facing event handlers.
//!
//! ```text
//! GET  /api/v1/events
//! GET  /api/v1/events/{id}?read=bool
//! POST /api/v1/events/registrations
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::EventId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::event_dto::{UserEventResponse, user_event_list};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_uuid};

/// Options for fetching a single event.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventReadQuery {
    /// Mark a new notification as seen while fetching.
    #[serde(default)]
    pub read: bool,
}

/// Request payload for answering an event invitation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub event_id: Option<String>,
    pub going: Option<bool>,
}

/// Events visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    description = "Upcoming events from subscribed cities, global events and events the caller answered.",
    responses(
        (status = 200, description = "Visible events, newest first", body = [UserEventResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 412, description = "Access token expired", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "listEvents"
)]
#[get("/events")]
pub async fn list_events(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<Vec<UserEventResponse>>> {
    let events = state
        .visibility
        .upcoming_events_with_going_status(auth.user_id())
        .await?;
    Ok(web::Json(user_event_list(events)))
}

/// One visible event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event identifier"), EventReadQuery),
    responses(
        (status = 200, description = "Event", body = UserEventResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not visible to the caller", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "getEvent"
)]
#[get("/events/{id}")]
pub async fn get_event(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    query: web::Query<EventReadQuery>,
) -> ApiResult<web::Json<UserEventResponse>> {
    let event_id = EventId::from(parse_uuid(&path, FieldName::new("id"))?);
    let event = state
        .visibility
        .single_event_for_user(auth.user_id(), &event_id, query.read)
        .await?;
    Ok(web::Json(UserEventResponse::from(event)))
}

/// Record whether the caller is going.
#[utoipa::path(
    post,
    path = "/api/v1/events/registrations",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "The answered event", body = UserEventResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown or hidden event", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "registerForEvent"
)]
#[post("/events/registrations")]
pub async fn register(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<RegistrationRequest>,
) -> ApiResult<HttpResponse> {
    let RegistrationRequest { event_id, going } = payload.into_inner();
    let field = FieldName::new("eventId");
    let event_id = event_id.ok_or_else(|| missing_field_error(field))?;
    let event_id = EventId::from(parse_uuid(&event_id, field)?);
    let going = going.ok_or_else(|| missing_field_error(FieldName::new("going")))?;
    let event = state
        .registrations
        .register(auth.user_id(), &event_id, going)
        .await?;
    Ok(HttpResponse::Created().json(UserEventResponse::from(event)))
}
