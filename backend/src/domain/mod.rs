//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the strongly typed entities of the city/event/notification
//! core and the services that implement its driving ports. Nothing in here
//! knows about HTTP or SQL; adapters reach the domain through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - City, Event, UserEvent and friends: entities and read models.
//! - `*Service` types: implementations of the driving ports.

pub mod city;
mod city_service;
pub mod error;
pub mod event;
mod event_service;
pub mod inbox;
mod inbox_service;
pub mod message;
mod message_interaction_service;
mod notification_fanout;
pub mod ports;
pub mod push;
mod push_token_service;
mod registration_service;
mod service_errors;
mod subscription_service;
pub mod trace_id;
pub mod user;
mod visibility_service;

pub use self::city::{
    City, CityId, CityPatch, CitySubscription, CitySubscriptionSummary, GeoPoint, GeoPointError,
    NewCity, nearest_containing, sort_by_distance, sort_by_name,
};
pub use self::city_service::{CityRegistryConfig, CityRegistryService};
pub use self::error::{Error, ErrorCode, Severity, TRACE_ID_HEADER};
pub use self::event::{
    AdminEvent, Event, EventCity, EventId, EventKey, EventLink, EventPatch, EventPublication,
    EventRegistration, NewEvent, effective_image_url, validate_window,
};
pub use self::event_service::{EventRegistryConfig, EventRegistryService};
pub use self::inbox::{BoardFirmwareNotice, Inbox, UserEvent};
pub use self::inbox_service::InboxService;
pub use self::message::{MessageState, MessageTarget, StoredMessageState};
pub use self::message_interaction_service::MessageInteractionService;
pub use self::notification_fanout::{
    DEFAULT_CONCURRENCY_LIMIT, FanoutConfig, FanoutReport, NotificationFanoutService,
};
pub use self::push::{
    EndpointArn, PlatformApplicationArn, PublishRequest, PushEndpoint, PushPlatform,
    PushSubscription, PushToken, PushTokenId, SubscriptionArn, TopicArn, build_event_message,
};
pub use self::push_token_service::PushTokenService;
pub use self::registration_service::EventRegistrationService;
pub use self::subscription_service::CitySubscriptionService;
pub use self::trace_id::TraceId;
pub use self::user::{User, UserId, UserIdError, UserRole};
pub use self::visibility_service::{EventVisibilityConfig, EventVisibilityService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use fleet_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// # assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
