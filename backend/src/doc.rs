//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every `/api/v1` handler plus the health probes. Domain
//! types stay free of utoipa derives; the wire DTOs in the inbound layer and
//! the wrappers in [`crate::inbound::http::schemas`] carry the schemas.
//!
//! The generated document backs Swagger UI in debug builds.

use crate::inbound::http::admin_cities::{
    CitySummaryResponse, CreateCityRequest, UpdateCityRequest,
};
use crate::inbound::http::admin_events::{CreateEventRequest, UpdateEventRequest};
use crate::inbound::http::cities::{CityResponse, SubscribeRequest};
use crate::inbound::http::event_dto::{
    AdminEventResponse, EventCityResponse, EventLinkDto, MessageStateDto, UserEventResponse,
};
use crate::inbound::http::events::RegistrationRequest;
use crate::inbound::http::inbox::{BoardUpdateResponse, InboxResponse, MessageInteractionRequest};
use crate::inbound::http::push_tokens::{PushTokenRequest, PushTokenResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by the identity service."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Fleet backend API",
        description = "City subscriptions, community events and rider notifications."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::cities::list_cities,
        crate::inbound::http::cities::city_at_location,
        crate::inbound::http::cities::list_subscriptions,
        crate::inbound::http::cities::subscribe,
        crate::inbound::http::cities::unsubscribe,
        crate::inbound::http::events::list_events,
        crate::inbound::http::events::get_event,
        crate::inbound::http::events::register,
        crate::inbound::http::inbox::get_inbox,
        crate::inbound::http::inbox::interact_with_message,
        crate::inbound::http::push_tokens::register_token,
        crate::inbound::http::push_tokens::remove_token,
        crate::inbound::http::admin_cities::list_cities,
        crate::inbound::http::admin_cities::city_summary,
        crate::inbound::http::admin_cities::get_city,
        crate::inbound::http::admin_cities::create_city,
        crate::inbound::http::admin_cities::update_city,
        crate::inbound::http::admin_cities::delete_city,
        crate::inbound::http::admin_events::list_events,
        crate::inbound::http::admin_events::get_event,
        crate::inbound::http::admin_events::create_event,
        crate::inbound::http::admin_events::update_event,
        crate::inbound::http::admin_events::delete_event,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CityResponse,
        CitySummaryResponse,
        CreateCityRequest,
        UpdateCityRequest,
        SubscribeRequest,
        UserEventResponse,
        AdminEventResponse,
        EventCityResponse,
        EventLinkDto,
        MessageStateDto,
        CreateEventRequest,
        UpdateEventRequest,
        RegistrationRequest,
        InboxResponse,
        BoardUpdateResponse,
        MessageInteractionRequest,
        PushTokenRequest,
        PushTokenResponse,
    )),
    tags(
        (name = "cities", description = "City catalogue and subscriptions"),
        (name = "events", description = "Events visible to riders"),
        (name = "inbox", description = "Inbox and message read state"),
        (name = "push", description = "Device push tokens"),
        (name = "admin", description = "Back-office city and event management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
