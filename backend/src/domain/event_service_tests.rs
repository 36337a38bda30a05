//! Tests for the event registry service.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    EventRepositoryError, MockCityRepository, MockEventNotifier, MockEventRepository,
};
use crate::domain::{ErrorCode, GeoPoint};
use crate::test_support::FixedClock;

const FALLBACK: &str = "https://cdn.test/fallback.png";

type Service = EventRegistryService<MockEventRepository, MockCityRepository, MockEventNotifier>;

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn city(name: &str, image_url: Option<&str>) -> City {
    let at = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp");
    City {
        id: CityId::random(),
        name: name.to_owned(),
        location: GeoPoint::new(14.42076, 50.08804).expect("valid point"),
        radius_m: 15_000,
        timezone: "Europe/Prague".to_owned(),
        image_url: image_url.map(str::to_owned),
        created_at: at,
        updated_at: at,
    }
}

fn new_event(now: DateTime<Utc>, city_id: Option<CityId>) -> NewEvent {
    NewEvent {
        name: "Meetup".to_owned(),
        description: "Evening ride".to_owned(),
        start_date: now + Duration::days(1),
        end_date: now + Duration::days(1) + Duration::hours(1),
        city_id,
        location: "Letna".to_owned(),
        image_url: None,
        link: None,
    }
}

fn stored(now: DateTime<Utc>, city_id: Option<CityId>) -> Event {
    new_event(now, city_id).into_event(now - Duration::days(2))
}

fn admin(event: Event) -> AdminEvent {
    AdminEvent {
        event,
        city: None,
        attending_count: 0,
        rejected_count: 0,
        subscriber_count: 0,
    }
}

fn service(
    events: MockEventRepository,
    cities: MockCityRepository,
    notifier: MockEventNotifier,
    now: DateTime<Utc>,
) -> Service {
    EventRegistryService::new(
        Arc::new(events),
        Arc::new(cities),
        Arc::new(notifier),
        Arc::new(FixedClock::new(now)),
        EventRegistryConfig {
            image_fallback_url: FALLBACK.to_owned(),
        },
    )
}

fn cities_returning(city: Option<City>) -> MockCityRepository {
    let mut cities = MockCityRepository::new();
    cities
        .expect_find_by_id()
        .returning(move |_| Ok(city.clone()));
    cities
}

#[rstest]
#[tokio::test]
async fn register_publishes_with_city_image_fallback(now: DateTime<Utc>) {
    let prague = city("Prague", Some("https://cdn.test/prague.png"));
    let prague_id = prague.id;
    let mut events = MockEventRepository::new();
    events
        .expect_exists_with_key()
        .times(1)
        .return_once(|_, _| Ok(false));
    events.expect_insert().times(1).return_once(|_| Ok(()));
    events
        .expect_list_admin()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let mut notifier = MockEventNotifier::new();
    notifier
        .expect_event_published()
        .times(1)
        .withf(move |publication| {
            publication.image_url == "https://cdn.test/prague.png"
                && publication.city.as_ref().map(|city| city.id) == Some(prague_id)
        })
        .return_once(|_| Ok(()));

    let service = service(events, cities_returning(Some(prague)), notifier, now);
    service
        .register(new_event(now, Some(prague_id)))
        .await
        .expect("event registered");
}

#[rstest]
#[tokio::test]
async fn register_global_event_uses_configured_fallback(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events.expect_exists_with_key().return_once(|_, _| Ok(false));
    events.expect_insert().return_once(|_| Ok(()));
    events.expect_list_admin().return_once(|_| Ok(Vec::new()));
    let mut notifier = MockEventNotifier::new();
    notifier
        .expect_event_published()
        .times(1)
        .withf(|publication| publication.city.is_none() && publication.image_url == FALLBACK)
        .return_once(|_| Ok(()));

    let service = service(events, MockCityRepository::new(), notifier, now);
    service
        .register(new_event(now, None))
        .await
        .expect("event registered");
}

#[rstest]
#[tokio::test]
async fn register_survives_notification_failure(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events.expect_exists_with_key().return_once(|_, _| Ok(false));
    events.expect_insert().times(1).return_once(|_| Ok(()));
    events.expect_list_admin().return_once(|_| Ok(Vec::new()));
    let mut notifier = MockEventNotifier::new();
    notifier
        .expect_event_published()
        .times(1)
        .return_once(|_| Err(Error::service_unavailable("gateway down")));

    let service = service(events, MockCityRepository::new(), notifier, now);
    let result = service.register(new_event(now, None)).await;

    assert!(result.is_ok());
}

#[rstest]
#[tokio::test]
async fn register_duplicate_conflicts_without_notifying(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events
        .expect_exists_with_key()
        .return_once(|_, _| Ok(true));
    events.expect_insert().never();
    let mut notifier = MockEventNotifier::new();
    notifier.expect_event_published().never();

    let service = service(events, MockCityRepository::new(), notifier, now);
    let error = service
        .register(new_event(now, None))
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn register_maps_racing_insert_to_conflict(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events.expect_exists_with_key().return_once(|_, _| Ok(false));
    events
        .expect_insert()
        .return_once(|_| Err(EventRepositoryError::duplicate("events_unique_key")));
    let mut notifier = MockEventNotifier::new();
    notifier.expect_event_published().never();

    let service = service(events, MockCityRepository::new(), notifier, now);
    let error = service
        .register(new_event(now, None))
        .await
        .expect_err("raced");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case::start_after_end(Duration::days(2), Duration::days(1), "start_not_before_end")]
#[case::start_equals_end(Duration::days(1), Duration::days(1), "start_not_before_end")]
#[case::start_yesterday(Duration::days(-1), Duration::days(1), "start_in_past")]
#[tokio::test]
async fn register_rejects_invalid_windows(
    now: DateTime<Utc>,
    #[case] start_offset: Duration,
    #[case] end_offset: Duration,
    #[case] code: &str,
) {
    let mut event = new_event(now, None);
    event.start_date = now + start_offset;
    event.end_date = now + end_offset;
    let mut events = MockEventRepository::new();
    events.expect_insert().never();

    let service = service(events, MockCityRepository::new(), MockEventNotifier::new(), now);
    let error = service.register(event).await.expect_err("invalid window");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details().and_then(|details| details.get("code")),
        Some(&serde_json::Value::from(code))
    );
}

#[rstest]
#[tokio::test]
async fn register_allows_earlier_start_on_same_day(now: DateTime<Utc>) {
    let mut event = new_event(now, None);
    event.start_date = now - Duration::hours(2);
    event.end_date = now + Duration::hours(2);
    let mut events = MockEventRepository::new();
    events.expect_exists_with_key().return_once(|_, _| Ok(false));
    events.expect_insert().return_once(|_| Ok(()));
    events.expect_list_admin().return_once(|_| Ok(Vec::new()));
    let mut notifier = MockEventNotifier::new();
    notifier.expect_event_published().return_once(|_| Ok(()));

    let service = service(events, MockCityRepository::new(), notifier, now);
    assert!(service.register(event).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn register_unknown_city_is_not_found(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events.expect_insert().never();

    let service = service(
        events,
        cities_returning(None),
        MockEventNotifier::new(),
        now,
    );
    let error = service
        .register(new_event(now, Some(CityId::random())))
        .await
        .expect_err("unknown city");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_rejects_inverted_window(now: DateTime<Utc>) {
    let current = stored(now, None);
    let id = current.id;
    let mut events = MockEventRepository::new();
    events
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    events.expect_update().never();

    let service = service(events, MockCityRepository::new(), MockEventNotifier::new(), now);
    let error = service
        .update(
            &id,
            EventPatch {
                end_date: Some(now),
                ..EventPatch::default()
            },
        )
        .await
        .expect_err("inverted window");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_to_same_city_is_rejected_without_fanout(now: DateTime<Utc>) {
    let prague = city("Prague", None);
    let current = stored(now, Some(prague.id));
    let id = current.id;
    let mut events = MockEventRepository::new();
    events
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    events.expect_update().never();
    let mut notifier = MockEventNotifier::new();
    notifier.expect_event_published().never();

    let service = service(events, cities_returning(Some(prague.clone())), notifier, now);
    let error = service
        .update(
            &id,
            EventPatch {
                city_id: Some(Some(prague.id)),
                ..EventPatch::default()
            },
        )
        .await
        .expect_err("no-op city change");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_to_new_city_republishes_once(now: DateTime<Utc>) {
    let brno = city("Brno", None);
    let brno_id = brno.id;
    let current = stored(now, None);
    let id = current.id;
    let refreshed = admin(current.clone());
    let mut events = MockEventRepository::new();
    events
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    events
        .expect_exists_with_key()
        .withf(move |key, excluding| key.city_id == Some(brno_id) && *excluding == Some(id))
        .return_once(|_, _| Ok(false));
    events
        .expect_update()
        .times(1)
        .withf(move |event| event.city_id == Some(brno_id) && event.published_at == now)
        .return_once(|_| Ok(()));
    events
        .expect_find_admin()
        .return_once(move |_| Ok(Some(refreshed)));
    let mut notifier = MockEventNotifier::new();
    notifier
        .expect_event_published()
        .times(1)
        .withf(move |publication| publication.city.as_ref().map(|city| city.id) == Some(brno_id))
        .return_once(|_| Ok(()));

    let service = service(events, cities_returning(Some(brno)), notifier, now);
    service
        .update(
            &id,
            EventPatch {
                city_id: Some(Some(brno_id)),
                ..EventPatch::default()
            },
        )
        .await
        .expect("republished");
}

#[rstest]
#[tokio::test]
async fn update_to_global_broadcasts_to_topic(now: DateTime<Utc>) {
    let prague = city("Prague", None);
    let current = stored(now, Some(prague.id));
    let id = current.id;
    let refreshed = admin(current.clone());
    let mut events = MockEventRepository::new();
    events
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    events.expect_exists_with_key().return_once(|_, _| Ok(false));
    events.expect_update().times(1).return_once(|_| Ok(()));
    events
        .expect_find_admin()
        .return_once(move |_| Ok(Some(refreshed)));
    let mut notifier = MockEventNotifier::new();
    notifier
        .expect_event_published()
        .times(1)
        .withf(|publication| publication.city.is_none() && publication.event.is_global())
        .return_once(|_| Ok(()));

    let service = service(events, MockCityRepository::new(), notifier, now);
    service
        .update(
            &id,
            EventPatch {
                city_id: Some(None),
                ..EventPatch::default()
            },
        )
        .await
        .expect("moved to global");
}

#[rstest]
#[tokio::test]
async fn update_without_city_change_does_not_notify(now: DateTime<Utc>) {
    let current = stored(now, None);
    let id = current.id;
    let published_at = current.published_at;
    let refreshed = admin(current.clone());
    let mut events = MockEventRepository::new();
    events
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    events.expect_exists_with_key().return_once(|_, _| Ok(false));
    events
        .expect_update()
        .times(1)
        .withf(move |event| event.name == "Renamed" && event.published_at == published_at)
        .return_once(|_| Ok(()));
    events
        .expect_find_admin()
        .return_once(move |_| Ok(Some(refreshed)));
    let mut notifier = MockEventNotifier::new();
    notifier.expect_event_published().never();

    let service = service(events, MockCityRepository::new(), notifier, now);
    service
        .update(
            &id,
            EventPatch {
                name: Some("Renamed".to_owned()),
                ..EventPatch::default()
            },
        )
        .await
        .expect("renamed");
}

#[rstest]
#[tokio::test]
async fn remove_missing_event_is_not_found(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events
        .expect_delete_cascade()
        .times(1)
        .return_once(|_| Ok(false));

    let service = service(events, MockCityRepository::new(), MockEventNotifier::new(), now);
    let error = service
        .remove(&EventId::random())
        .await
        .expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn remove_surfaces_failed_transaction_as_internal(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events
        .expect_delete_cascade()
        .return_once(|_| Err(EventRepositoryError::transaction("rolled back")));

    let service = service(events, MockCityRepository::new(), MockEventNotifier::new(), now);
    let error = service
        .remove(&EventId::random())
        .await
        .expect_err("rolled back");

    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn get_by_id_reports_missing_event(now: DateTime<Utc>) {
    let mut events = MockEventRepository::new();
    events.expect_find_admin().returning(|_| Ok(None));

    let service = service(events, MockCityRepository::new(), MockEventNotifier::new(), now);
    let id = EventId::random();

    assert!(service.find_by_id(&id).await.expect("lookup").is_none());
    assert_eq!(
        service.get_by_id(&id).await.expect_err("missing").code(),
        ErrorCode::NotFound
    );
}
