//! Real services wired over in-memory adapters.

use std::sync::Arc;

use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::FixtureTimezoneLookup;
use crate::domain::{
    CityId, CityRegistryConfig, CityRegistryService, CitySubscriptionService,
    DEFAULT_CONCURRENCY_LIMIT, EventRegistrationService, EventRegistryConfig,
    EventRegistryService, EventVisibilityConfig, EventVisibilityService, FanoutConfig,
    InboxService, MessageInteractionService, NotificationFanoutService, PlatformApplicationArn,
    PushTokenService, TopicArn, User, UserId, UserRole,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

use super::{FixedClock, InMemoryStore, RecordingPushGateway, StaticTokenVerifier};

/// Topic every registered endpoint is subscribed to.
pub const TEST_TOPIC_ARN: &str = "arn:aws:sns:eu-central-1:000000000000:fleet-events";
/// Image used when neither an event nor its city has one.
pub const FALLBACK_IMAGE_URL: &str = "https://cdn.fleet.test/events/fallback.png";
/// Radius given to cities registered without one.
pub const DEFAULT_RADIUS_M: u32 = 15_000;

type Fanout = NotificationFanoutService<RecordingPushGateway, InMemoryStore>;
type Visibility = EventVisibilityService<InMemoryStore, InMemoryStore>;
type Registrations = EventRegistrationService<
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
    Visibility,
>;

/// Shared doubles plus the services built on them.
pub struct TestHarness {
    /// Persistence double shared by every service.
    pub store: Arc<InMemoryStore>,
    /// Push gateway double.
    pub gateway: Arc<RecordingPushGateway>,
    /// Clock injected into every service.
    pub clock: Arc<FixedClock>,
    /// Bearer token table.
    pub tokens: Arc<StaticTokenVerifier>,
    /// Protected fixture city.
    pub test_city_id: CityId,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self {
            store: Arc::new(InMemoryStore::default()),
            gateway: Arc::new(RecordingPushGateway::default()),
            clock: Arc::new(FixedClock::default()),
            tokens: Arc::new(StaticTokenVerifier::default()),
            test_city_id: CityId::from(Uuid::from_u128(1)),
        }
    }
}

impl TestHarness {
    /// Create a user with `role`, accept `token` for them and return the id.
    pub fn grant(&self, token: impl Into<String>, role: UserRole) -> UserId {
        let user = User {
            id: UserId::random(),
            role,
        };
        self.store.add_user(user.clone());
        self.tokens.grant(token, user.clone());
        user.id
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Fan-out engine over the gateway double.
    pub fn fanout(&self) -> Arc<Fanout> {
        Arc::new(NotificationFanoutService::new(
            self.gateway.clone(),
            self.store.clone(),
            FanoutConfig {
                topic_arn: TopicArn::new(TEST_TOPIC_ARN),
                concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
                android_application_arn: PlatformApplicationArn::new("arn:app/GCM/fleet"),
                ios_application_arn: PlatformApplicationArn::new("arn:app/APNS/fleet"),
            },
        ))
    }

    /// City registry.
    pub fn cities(
        &self,
    ) -> Arc<CityRegistryService<InMemoryStore, InMemoryStore, FixtureTimezoneLookup>> {
        Arc::new(CityRegistryService::new(
            self.store.clone(),
            self.store.clone(),
            Arc::new(FixtureTimezoneLookup),
            self.clock(),
            CityRegistryConfig {
                default_radius_m: DEFAULT_RADIUS_M,
                test_city_id: self.test_city_id,
            },
        ))
    }

    /// Subscription store.
    pub fn subscriptions(
        &self,
    ) -> Arc<CitySubscriptionService<InMemoryStore, InMemoryStore, InMemoryStore>> {
        Arc::new(CitySubscriptionService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.clock(),
        ))
    }

    /// Event registry notifying through the fan-out engine.
    pub fn events(&self) -> Arc<EventRegistryService<InMemoryStore, InMemoryStore, Fanout>> {
        Arc::new(EventRegistryService::new(
            self.store.clone(),
            self.store.clone(),
            self.fanout(),
            self.clock(),
            EventRegistryConfig {
                image_fallback_url: FALLBACK_IMAGE_URL.to_owned(),
            },
        ))
    }

    /// Visibility resolver.
    pub fn visibility(&self) -> Arc<Visibility> {
        Arc::new(EventVisibilityService::new(
            self.store.clone(),
            self.store.clone(),
            self.clock(),
            EventVisibilityConfig {
                image_fallback_url: FALLBACK_IMAGE_URL.to_owned(),
            },
        ))
    }

    /// Registration ledger gated by `visibility`.
    pub fn registrations(
        &self,
        visibility: Arc<Visibility>,
    ) -> Arc<Registrations> {
        Arc::new(EventRegistrationService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            visibility,
            self.clock(),
        ))
    }

    /// Message interaction store gated by `visibility`.
    pub fn interactions(
        &self,
        visibility: Arc<Visibility>,
    ) -> Arc<MessageInteractionService<InMemoryStore, Visibility, InMemoryStore>> {
        Arc::new(MessageInteractionService::new(
            self.store.clone(),
            visibility,
            self.store.clone(),
        ))
    }

    /// Push token registration over the fan-out engine.
    pub fn push_tokens(&self) -> Arc<PushTokenService<RecordingPushGateway, InMemoryStore>> {
        Arc::new(PushTokenService::new(
            self.fanout(),
            self.store.clone(),
            self.clock(),
        ))
    }

    /// Build the handler state over the real services.
    pub fn http_state(&self) -> HttpState {
        let cities = self.cities();
        let subscriptions = self.subscriptions();
        let events = self.events();
        let visibility = self.visibility();
        let ports = HttpStatePorts {
            cities: cities.clone(),
            cities_query: cities,
            subscriptions: subscriptions.clone(),
            subscriptions_query: subscriptions,
            events: events.clone(),
            events_query: events,
            visibility: visibility.clone(),
            inbox: Arc::new(InboxService::new(visibility.clone(), self.store.clone())),
            registrations: self.registrations(visibility.clone()),
            interactions: self.interactions(visibility),
            push_tokens: self.push_tokens(),
        };
        HttpState::new(ports, self.tokens.clone())
    }
}
