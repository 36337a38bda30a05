//! Inbox composition and message read state.
//!
//! ```text
//! GET  /api/v1/inbox
//! POST /api/v1/inbox/message-interaction
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BoardFirmwareNotice, Error, EventId, MessageTarget, StoredMessageState};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::event_dto::{UserEventResponse, user_event_list};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, missing_field_error, parse_uuid,
};

/// A board whose firmware is behind the newest release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdateResponse {
    pub serial_number: String,
    pub current_version: Option<String>,
    pub latest_version: String,
}

impl From<BoardFirmwareNotice> for BoardUpdateResponse {
    fn from(value: BoardFirmwareNotice) -> Self {
        Self {
            serial_number: value.serial_number,
            current_version: value.current_version,
            latest_version: value.latest_version,
        }
    }
}

/// Everything the rider's inbox shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InboxResponse {
    pub events: Vec<UserEventResponse>,
    pub boards: Vec<BoardUpdateResponse>,
    /// Reserved; always empty.
    #[schema(value_type = Vec<Object>)]
    pub marketing_messages: Vec<serde_json::Value>,
}

/// Request payload for marking a message.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageInteractionRequest {
    /// The event the message refers to.
    pub message_id: Option<String>,
    /// `seen` or `deleted`.
    pub message_state: Option<String>,
}

fn parse_stored_state(raw: &str) -> Result<StoredMessageState, Error> {
    StoredMessageState::from_column(raw).ok_or_else(|| {
        invalid_value_error(
            FieldName::new("messageState"),
            "messageState must be seen or deleted",
            raw,
        )
    })
}

fn parse_interaction(
    payload: MessageInteractionRequest,
) -> Result<(MessageTarget, StoredMessageState), Error> {
    let id_field = FieldName::new("messageId");
    let message_id = payload
        .message_id
        .ok_or_else(|| missing_field_error(id_field))?;
    let state = payload
        .message_state
        .ok_or_else(|| missing_field_error(FieldName::new("messageState")))?;
    let target = MessageTarget::Event {
        event_id: EventId::from(parse_uuid(&message_id, id_field)?),
    };
    Ok((target, parse_stored_state(&state)?))
}

/// The caller's inbox.
#[utoipa::path(
    get,
    path = "/api/v1/inbox",
    responses(
        (status = 200, description = "Inbox", body = InboxResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["inbox"],
    operation_id = "getInbox"
)]
#[get("/inbox")]
pub async fn get_inbox(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<InboxResponse>> {
    let inbox = state.inbox.inbox(auth.user_id()).await?;
    Ok(web::Json(InboxResponse {
        events: user_event_list(inbox.events),
        boards: inbox
            .boards
            .into_iter()
            .map(BoardUpdateResponse::from)
            .collect(),
        marketing_messages: Vec::new(),
    }))
}

/// Mark a message as seen or deleted and return the refreshed event list.
#[utoipa::path(
    post,
    path = "/api/v1/inbox/message-interaction",
    request_body = MessageInteractionRequest,
    responses(
        (status = 201, description = "Visible events after the change", body = [UserEventResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown or hidden message", body = ErrorSchema)
    ),
    tags = ["inbox"],
    operation_id = "interactWithMessage"
)]
#[post("/inbox/message-interaction")]
pub async fn interact_with_message(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<MessageInteractionRequest>,
) -> ApiResult<HttpResponse> {
    let (target, stored) = parse_interaction(payload.into_inner())?;
    state
        .interactions
        .interact_with_message(auth.user_id(), target, stored)
        .await?;
    let events = state
        .visibility
        .upcoming_events_with_going_status(auth.user_id())
        .await?;
    Ok(HttpResponse::Created().json(user_event_list(events)))
}
