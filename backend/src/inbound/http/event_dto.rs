//! Event payloads shared by the rider and back-office handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AdminEvent, Event, EventCity, EventLink, MessageState, UserEvent};

/// Call-to-action link attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventLinkDto {
    pub text: String,
    pub url: String,
}

impl From<EventLink> for EventLinkDto {
    fn from(value: EventLink) -> Self {
        Self {
            text: value.text,
            url: value.url,
        }
    }
}

/// City an event takes place in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventCityResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub timezone: String,
}

impl From<EventCity> for EventCityResponse {
    fn from(value: EventCity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            longitude: value.location.longitude(),
            latitude: value.location.latitude(),
            timezone: value.timezone,
        }
    }
}

/// Read state of the notification for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageStateDto {
    New,
    Seen,
    Deleted,
}

impl From<MessageState> for MessageStateDto {
    fn from(value: MessageState) -> Self {
        match value {
            MessageState::New => Self::New,
            MessageState::Seen => Self::Seen,
            MessageState::Deleted => Self::Deleted,
        }
    }
}

/// Fields common to every event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub name: String,
    pub description: String,
    /// RFC 3339 start.
    pub start_date: String,
    /// RFC 3339 end.
    pub end_date: String,
    pub location: String,
    pub link: Option<EventLinkDto>,
    pub city: Option<EventCityResponse>,
    pub published_at: String,
}

impl EventBody {
    fn new(event: Event, city: Option<EventCity>) -> Self {
        Self {
            id: event.id.to_string(),
            name: event.name,
            description: event.description,
            start_date: event.start_date.to_rfc3339(),
            end_date: event.end_date.to_rfc3339(),
            location: event.location,
            link: event.link.map(EventLinkDto::from),
            city: city.map(EventCityResponse::from),
            published_at: event.published_at.to_rfc3339(),
        }
    }
}

/// An event as seen in a rider's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserEventResponse {
    #[serde(flatten)]
    pub event: EventBody,
    /// Event image, else the city image, else the global fallback.
    pub image_url: Option<String>,
    /// `null` until the rider answers.
    pub going: Option<bool>,
    pub message_state: MessageStateDto,
}

impl From<UserEvent> for UserEventResponse {
    fn from(value: UserEvent) -> Self {
        Self {
            event: EventBody::new(value.event, value.city),
            image_url: value.image_url,
            going: value.going,
            message_state: value.message_state.into(),
        }
    }
}

pub(crate) fn user_event_list(events: Vec<UserEvent>) -> Vec<UserEventResponse> {
    events.into_iter().map(UserEventResponse::from).collect()
}

/// An event with attendance aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminEventResponse {
    #[serde(flatten)]
    pub event: EventBody,
    /// Stored image; no fallback applied.
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub attending_count: u64,
    pub rejected_count: u64,
    /// Active subscribers of the city, or every user for global events.
    pub subscriber_count: u64,
}

impl From<AdminEvent> for AdminEventResponse {
    fn from(value: AdminEvent) -> Self {
        let AdminEvent {
            event,
            city,
            attending_count,
            rejected_count,
            subscriber_count,
        } = value;
        let image_url = event.image_url.clone();
        let created_at = event.created_at.to_rfc3339();
        let updated_at = event.updated_at.to_rfc3339();
        Self {
            event: EventBody::new(event, city),
            image_url,
            created_at,
            updated_at,
            attending_count,
            rejected_count,
            subscriber_count,
        }
    }
}

pub(crate) fn admin_event_list(events: Vec<AdminEvent>) -> Vec<AdminEventResponse> {
    events.into_iter().map(AdminEventResponse::from).collect()
}
