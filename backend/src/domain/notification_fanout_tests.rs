//! Tests for the notification fan-out engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockPushGateway, MockPushTokenRepository, PushTokenRepositoryError};
use crate::domain::{CityId, GeoPoint, NewEvent, PushEndpoint};

#[fixture]
fn config() -> FanoutConfig {
    FanoutConfig {
        topic_arn: TopicArn::new("arn:topic/events"),
        concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        android_application_arn: PlatformApplicationArn::new("arn:app/GCM/fleet"),
        ios_application_arn: PlatformApplicationArn::new("arn:app/APNS/fleet"),
    }
}

fn city() -> EventCity {
    EventCity {
        id: CityId::random(),
        name: "Prague".to_owned(),
        location: GeoPoint::new(14.42076, 50.08804).expect("valid point"),
        timezone: "Europe/Prague".to_owned(),
        image_url: None,
    }
}

fn publication(city: Option<EventCity>) -> EventPublication {
    let now = Utc
        .with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    let event = NewEvent {
        name: "Meetup".to_owned(),
        description: "Evening ride".to_owned(),
        start_date: now + Duration::days(1),
        end_date: now + Duration::days(1) + Duration::hours(1),
        city_id: city.as_ref().map(|city| city.id),
        location: "Letna".to_owned(),
        image_url: None,
        link: None,
    }
    .into_event(now);
    EventPublication {
        event,
        city,
        image_url: "https://cdn.test/fallback.png".to_owned(),
    }
}

fn endpoint(arn: &str) -> PushEndpoint {
    PushEndpoint {
        token_id: PushTokenId::random(),
        endpoint_arn: EndpointArn::new(arn),
    }
}

#[rstest]
#[tokio::test]
async fn global_event_is_published_once_to_topic(config: FanoutConfig) {
    let mut gateway = MockPushGateway::new();
    gateway
        .expect_publish()
        .times(1)
        .withf(|request| {
            request.topic_arn().map(TopicArn::as_str) == Some("arn:topic/events")
                && request.target_arn().is_none()
        })
        .return_once(|_| Ok(()));
    let mut tokens = MockPushTokenRepository::new();
    tokens.expect_enabled_endpoints_for_city().never();

    let service = NotificationFanoutService::new(Arc::new(gateway), Arc::new(tokens), config);
    service
        .event_published(&publication(None))
        .await
        .expect("published");
}

#[rstest]
#[tokio::test]
async fn disabled_endpoint_is_switched_off_without_aborting_batch(config: FanoutConfig) {
    let alive_a = endpoint("arn:endpoint/a");
    let dead = endpoint("arn:endpoint/dead");
    let alive_b = endpoint("arn:endpoint/b");
    let dead_id = dead.token_id;
    let endpoints = vec![alive_a, dead, alive_b];

    let mut gateway = MockPushGateway::new();
    gateway.expect_publish().times(3).returning(|request| {
        match request.target_arn().map(EndpointArn::as_str) {
            Some("arn:endpoint/dead") => Err(PushGatewayError::endpoint_disabled("gone")),
            _ => Ok(()),
        }
    });
    let mut tokens = MockPushTokenRepository::new();
    tokens
        .expect_enabled_endpoints_for_city()
        .return_once(move |_| Ok(endpoints));
    tokens
        .expect_disable()
        .times(1)
        .withf(move |ids| ids.len() == 1 && ids[0] == dead_id)
        .return_once(|_| Ok(1));

    let service = NotificationFanoutService::new(Arc::new(gateway), Arc::new(tokens), config);
    let target = city();
    let report = service
        .publish_to_city(&publication(Some(target.clone())), &target)
        .await
        .expect("batch completes");

    assert_eq!(report.delivered, 2);
    assert_eq!(report.disabled, vec![dead_id]);
}

#[rstest]
#[tokio::test]
async fn other_gateway_failure_fails_batch_after_cleanup(config: FanoutConfig) {
    let endpoints = vec![endpoint("arn:endpoint/dead"), endpoint("arn:endpoint/broken")];
    let mut gateway = MockPushGateway::new();
    gateway.expect_publish().times(2).returning(|request| {
        match request.target_arn().map(EndpointArn::as_str) {
            Some("arn:endpoint/dead") => Err(PushGatewayError::endpoint_disabled("gone")),
            _ => Err(PushGatewayError::transport("timeout")),
        }
    });
    let mut tokens = MockPushTokenRepository::new();
    tokens
        .expect_enabled_endpoints_for_city()
        .return_once(move |_| Ok(endpoints));
    tokens.expect_disable().times(1).return_once(|_| Ok(1));

    let service = NotificationFanoutService::new(Arc::new(gateway), Arc::new(tokens), config);
    let target = city();
    let error = service
        .publish_to_city(&publication(Some(target.clone())), &target)
        .await
        .expect_err("transport failure");

    assert_eq!(error.code(), crate::domain::ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn city_without_endpoints_publishes_nothing(config: FanoutConfig) {
    let mut gateway = MockPushGateway::new();
    gateway.expect_publish().never();
    let mut tokens = MockPushTokenRepository::new();
    tokens
        .expect_enabled_endpoints_for_city()
        .return_once(|_| Ok(Vec::new()));
    tokens.expect_disable().never();

    let service = NotificationFanoutService::new(Arc::new(gateway), Arc::new(tokens), config);
    let target = city();
    let report = service
        .publish_to_city(&publication(Some(target.clone())), &target)
        .await
        .expect("empty batch");

    assert_eq!(report, FanoutReport::default());
}

#[rstest]
#[tokio::test]
async fn endpoint_lookup_failure_propagates(config: FanoutConfig) {
    let mut tokens = MockPushTokenRepository::new();
    tokens
        .expect_enabled_endpoints_for_city()
        .return_once(|_| Err(PushTokenRepositoryError::connection("refused")));

    let service =
        NotificationFanoutService::new(Arc::new(MockPushGateway::new()), Arc::new(tokens), config);
    let target = city();
    let error = service
        .publish_to_city(&publication(Some(target.clone())), &target)
        .await
        .expect_err("lookup failed");

    assert_eq!(error.code(), crate::domain::ErrorCode::ServiceUnavailable);
}

/// Gateway that records the highest number of overlapping publishes.
#[derive(Default)]
struct CountingGateway {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl PushGateway for CountingGateway {
    async fn create_platform_endpoint(
        &self,
        _application: &PlatformApplicationArn,
        _token: &str,
    ) -> Result<EndpointArn, PushGatewayError> {
        Err(PushGatewayError::rejected("unused"))
    }

    async fn subscribe(
        &self,
        _topic: &TopicArn,
        _endpoint: &EndpointArn,
    ) -> Result<SubscriptionArn, PushGatewayError> {
        Err(PushGatewayError::rejected("unused"))
    }

    async fn unsubscribe(&self, _subscription: &SubscriptionArn) -> Result<(), PushGatewayError> {
        Ok(())
    }

    async fn publish(&self, _request: &PublishRequest) -> Result<(), PushGatewayError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_endpoint_enabled(
        &self,
        _endpoint: &EndpointArn,
        _enabled: bool,
    ) -> Result<(), PushGatewayError> {
        Ok(())
    }
}

#[rstest]
#[tokio::test]
async fn city_publishes_respect_concurrency_limit(config: FanoutConfig) {
    let config = FanoutConfig {
        concurrency_limit: 3,
        ..config
    };
    let endpoints: Vec<_> = (0..12)
        .map(|index| endpoint(&format!("arn:endpoint/{index}")))
        .collect();
    let mut tokens = MockPushTokenRepository::new();
    tokens
        .expect_enabled_endpoints_for_city()
        .return_once(move |_| Ok(endpoints));
    let gateway = Arc::new(CountingGateway::default());

    let service = NotificationFanoutService::new(Arc::clone(&gateway), Arc::new(tokens), config);
    let target = city();
    let report = service
        .publish_to_city(&publication(Some(target.clone())), &target)
        .await
        .expect("batch completes");

    assert_eq!(report.delivered, 12);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 12);
    assert!(gateway.peak.load(Ordering::SeqCst) <= 3);
}

#[rstest]
#[case(Some("device-1"), "arn:app/GCM/fleet")]
#[case(None, "arn:app/APNS/fleet")]
#[tokio::test]
async fn endpoint_generation_picks_platform_by_device_id(
    config: FanoutConfig,
    #[case] device_id: Option<&'static str>,
    #[case] application: &'static str,
) {
    let mut gateway = MockPushGateway::new();
    gateway
        .expect_create_platform_endpoint()
        .times(1)
        .withf(move |app, token| app.as_str() == application && *token == *"token-1")
        .return_once(|_, _| Ok(EndpointArn::new("arn:endpoint/new")));

    let service = NotificationFanoutService::new(
        Arc::new(gateway),
        Arc::new(MockPushTokenRepository::new()),
        config,
    );
    let arn = service
        .generate_platform_endpoint_arn("token-1", device_id)
        .await
        .expect("endpoint created");

    assert_eq!(arn.as_str(), "arn:endpoint/new");
}
