//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccessTokenVerifier, CityCommand, CityQuery, EventCommand, EventQuery, EventVisibilityQuery,
    InboxQuery, MessageInteractionCommand, PushTokenCommand, RegistrationCommand,
    SubscriptionCommand, SubscriptionQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub cities: Arc<dyn CityCommand>,
    pub cities_query: Arc<dyn CityQuery>,
    pub subscriptions: Arc<dyn SubscriptionCommand>,
    pub subscriptions_query: Arc<dyn SubscriptionQuery>,
    pub events: Arc<dyn EventCommand>,
    pub events_query: Arc<dyn EventQuery>,
    pub visibility: Arc<dyn EventVisibilityQuery>,
    pub inbox: Arc<dyn InboxQuery>,
    pub registrations: Arc<dyn RegistrationCommand>,
    pub interactions: Arc<dyn MessageInteractionCommand>,
    pub push_tokens: Arc<dyn PushTokenCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub cities: Arc<dyn CityCommand>,
    pub cities_query: Arc<dyn CityQuery>,
    pub subscriptions: Arc<dyn SubscriptionCommand>,
    pub subscriptions_query: Arc<dyn SubscriptionQuery>,
    pub events: Arc<dyn EventCommand>,
    pub events_query: Arc<dyn EventQuery>,
    pub visibility: Arc<dyn EventVisibilityQuery>,
    pub inbox: Arc<dyn InboxQuery>,
    pub registrations: Arc<dyn RegistrationCommand>,
    pub interactions: Arc<dyn MessageInteractionCommand>,
    pub push_tokens: Arc<dyn PushTokenCommand>,
    pub tokens: Arc<dyn AccessTokenVerifier>,
}

impl HttpState {
    /// Construct state from a ports bundle and the bearer token verifier.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use fleet_backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use fleet_backend::outbound::auth::{JwtAccessTokenVerifier, JwtSettings};
    ///
    /// # fn ports() -> HttpStatePorts { unimplemented!() }
    /// let verifier = JwtAccessTokenVerifier::new(&JwtSettings {
    ///     secret: "change-me".to_owned(),
    ///     issuer: None,
    ///     leeway_seconds: 30,
    /// });
    /// let state = HttpState::new(ports(), Arc::new(verifier));
    /// let _cities = state.cities_query.clone();
    /// ```
    pub fn new(ports: HttpStatePorts, tokens: Arc<dyn AccessTokenVerifier>) -> Self {
        let HttpStatePorts {
            cities,
            cities_query,
            subscriptions,
            subscriptions_query,
            events,
            events_query,
            visibility,
            inbox,
            registrations,
            interactions,
            push_tokens,
        } = ports;
        Self {
            cities,
            cities_query,
            subscriptions,
            subscriptions_query,
            events,
            events_query,
            visibility,
            inbox,
            registrations,
            interactions,
            push_tokens,
            tokens,
        }
    }
}
