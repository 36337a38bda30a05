//! Builders wiring Diesel repositories and outbound adapters into services.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use fleet_backend::domain::{
    CityRegistryService, CitySubscriptionService, EventRegistrationService, EventRegistryConfig,
    EventRegistryService, EventVisibilityConfig, EventVisibilityService, InboxService,
    MessageInteractionService, NotificationFanoutService, PushTokenService,
};
use fleet_backend::inbound::http::state::{HttpState, HttpStatePorts};
use fleet_backend::outbound::auth::JwtAccessTokenVerifier;
use fleet_backend::outbound::geocoding::HttpTimezoneLookup;
use fleet_backend::outbound::persistence::{
    DbPool, DieselBoardFirmwareQuery, DieselCityRepository, DieselCitySubscriptionRepository,
    DieselEventRegistrationRepository, DieselEventRepository, DieselEventVisibilityRepository,
    DieselMessageInteractionRepository, DieselPushTokenRepository, DieselUserDirectory,
};
use fleet_backend::outbound::push::{HttpPushGateway, PushRelayIdentity};

use super::ServerConfig;
use super::config::AdapterConfig;

/// One instance of every repository, shared across services.
struct Repositories {
    users: Arc<DieselUserDirectory>,
    cities: Arc<DieselCityRepository>,
    subscriptions: Arc<DieselCitySubscriptionRepository>,
    events: Arc<DieselEventRepository>,
    visibility: Arc<DieselEventVisibilityRepository>,
    registrations: Arc<DieselEventRegistrationRepository>,
    interactions: Arc<DieselMessageInteractionRepository>,
    push_tokens: Arc<DieselPushTokenRepository>,
    boards: Arc<DieselBoardFirmwareQuery>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserDirectory::new(pool.clone())),
            cities: Arc::new(DieselCityRepository::new(pool.clone())),
            subscriptions: Arc::new(DieselCitySubscriptionRepository::new(pool.clone())),
            events: Arc::new(DieselEventRepository::new(pool.clone())),
            visibility: Arc::new(DieselEventVisibilityRepository::new(pool.clone())),
            registrations: Arc::new(DieselEventRegistrationRepository::new(pool.clone())),
            interactions: Arc::new(DieselMessageInteractionRepository::new(pool.clone())),
            push_tokens: Arc::new(DieselPushTokenRepository::new(pool.clone())),
            boards: Arc::new(DieselBoardFirmwareQuery::new(pool.clone())),
        }
    }
}

fn client_error(adapter: &str, err: reqwest::Error) -> io::Error {
    io::Error::other(format!("failed to build {adapter} client: {err}"))
}

fn build_push_gateway(adapters: &AdapterConfig) -> io::Result<HttpPushGateway> {
    HttpPushGateway::with_identity(
        adapters.push_relay_url.clone(),
        adapters.http_timeout,
        PushRelayIdentity {
            api_key: adapters.push_relay_api_key.clone(),
            ..PushRelayIdentity::default()
        },
    )
    .map_err(|err| client_error("push relay", err))
}

fn build_timezone_lookup(adapters: &AdapterConfig) -> io::Result<HttpTimezoneLookup> {
    HttpTimezoneLookup::new(
        adapters.timezone_api_url.clone(),
        adapters.timezone_api_key.clone(),
        adapters.http_timeout,
    )
    .map_err(|err| client_error("timezone", err))
}

/// Build the shared HTTP state over the database pool and outbound adapters.
///
/// # Errors
///
/// Returns [`io::Error`] when an outbound HTTP client cannot be constructed.
pub(super) fn build_http_state(config: &ServerConfig) -> io::Result<web::Data<HttpState>> {
    let repos = Repositories::new(&config.db_pool);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let services = &config.services;

    let fanout = Arc::new(NotificationFanoutService::new(
        Arc::new(build_push_gateway(&config.adapters)?),
        repos.push_tokens.clone(),
        services.fanout.clone(),
    ));
    let cities = Arc::new(CityRegistryService::new(
        repos.cities.clone(),
        repos.subscriptions.clone(),
        Arc::new(build_timezone_lookup(&config.adapters)?),
        clock.clone(),
        services.cities,
    ));
    let subscriptions = Arc::new(CitySubscriptionService::new(
        repos.users.clone(),
        repos.cities.clone(),
        repos.subscriptions.clone(),
        clock.clone(),
    ));
    let events = Arc::new(EventRegistryService::new(
        repos.events.clone(),
        repos.cities.clone(),
        fanout.clone(),
        clock.clone(),
        EventRegistryConfig {
            image_fallback_url: services.image_fallback_url.clone(),
        },
    ));
    let visibility = Arc::new(EventVisibilityService::new(
        repos.visibility.clone(),
        repos.interactions.clone(),
        clock.clone(),
        EventVisibilityConfig {
            image_fallback_url: services.image_fallback_url.clone(),
        },
    ));
    let registrations = Arc::new(EventRegistrationService::new(
        repos.users.clone(),
        repos.events.clone(),
        repos.subscriptions.clone(),
        repos.registrations.clone(),
        visibility.clone(),
        clock.clone(),
    ));
    let interactions = Arc::new(MessageInteractionService::new(
        repos.users.clone(),
        visibility.clone(),
        repos.interactions.clone(),
    ));
    let push_tokens = Arc::new(PushTokenService::new(fanout, repos.push_tokens, clock));

    let ports = HttpStatePorts {
        cities: cities.clone(),
        cities_query: cities,
        subscriptions: subscriptions.clone(),
        subscriptions_query: subscriptions,
        events: events.clone(),
        events_query: events,
        visibility: visibility.clone(),
        inbox: Arc::new(InboxService::new(visibility, repos.boards)),
        registrations,
        interactions,
        push_tokens,
    };
    let tokens = Arc::new(JwtAccessTokenVerifier::new(&config.adapters.jwt));
    Ok(web::Data::new(HttpState::new(ports, tokens)))
}
