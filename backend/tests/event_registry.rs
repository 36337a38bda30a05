//! Event registry invariants and republication.

use chrono::TimeDelta;
use fleet_backend::domain::ports::{
    EventCommand, PushTokenCommand, PushTokenRegistration, RegistrationCommand,
    SubscriptionCommand,
};
use fleet_backend::domain::{CityId, ErrorCode, EventId, EventPatch, UserRole};
use fleet_backend::test_support::TestHarness;
use rstest::{fixture, rstest};

mod support;

use support::{brno_centre, event_in, prague_centre, register_city};

#[fixture]
fn harness() -> TestHarness {
    TestHarness::default()
}

async fn register_event(harness: &TestHarness, name: &str, city_id: Option<CityId>) -> EventId {
    harness
        .events()
        .register(event_in(harness, name, city_id, 1))
        .await
        .expect("event registers")
        .into_iter()
        .find(|row| row.event.name == name)
        .map(|row| row.event.id)
        .expect("registered event is listed")
}

#[rstest]
#[tokio::test]
async fn identical_events_conflict_but_any_key_change_is_accepted(harness: TestHarness) {
    let city = register_city(&harness, "Prague", prague_centre()).await;
    let events = harness.events();
    let base = event_in(&harness, "Meetup", Some(city.id), 1);

    events.register(base.clone()).await.expect("first copy");
    let err = events
        .register(base.clone())
        .await
        .expect_err("duplicate tuple");
    assert_eq!(err.code(), ErrorCode::Conflict);

    let mut renamed = base.clone();
    renamed.name = "Meetup II".to_owned();
    let mut later = base.clone();
    later.start_date += TimeDelta::minutes(5);
    let mut longer = base.clone();
    longer.end_date += TimeDelta::minutes(5);
    let mut global = base;
    global.city_id = None;
    for variant in [renamed, later, longer, global] {
        events.register(variant).await.expect("distinct tuple");
    }
}

#[rstest]
#[tokio::test]
async fn start_must_precede_end_on_create_and_update(harness: TestHarness) {
    let events = harness.events();
    let mut inverted = event_in(&harness, "Backwards", None, 2);
    inverted.end_date = inverted.start_date;
    let err = events.register(inverted).await.expect_err("empty window");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    let id = register_event(&harness, "Forwards", None).await;
    let current = event_in(&harness, "Forwards", None, 1);
    let err = events
        .update(
            &id,
            EventPatch {
                end_date: Some(current.start_date - TimeDelta::minutes(1)),
                ..EventPatch::default()
            },
        )
        .await
        .expect_err("end before start");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn past_start_dates_are_rejected(harness: TestHarness) {
    let stale = event_in(&harness, "Yesterday", None, -1);
    let err = harness
        .events()
        .register(stale)
        .await
        .expect_err("in the past");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn moving_an_event_republishes_to_the_new_city_only(harness: TestHarness) {
    let prague = register_city(&harness, "Prague", prague_centre()).await;
    let brno = register_city(&harness, "Brno", brno_centre()).await;
    let rider = harness.grant("rider", UserRole::User);
    harness
        .subscriptions()
        .subscribe(&rider, &brno.id)
        .await
        .expect("subscribed to Brno");
    let token = harness
        .push_tokens()
        .register_token(
            &rider,
            PushTokenRegistration {
                token: "fcm-rider".to_owned(),
                device_id: Some("pixel".to_owned()),
            },
        )
        .await
        .expect("token registered");

    let id = register_event(&harness, "Meetup", Some(prague.id)).await;
    assert!(harness.gateway.published().is_empty());

    harness
        .events()
        .update(
            &id,
            EventPatch {
                city_id: Some(Some(brno.id)),
                ..EventPatch::default()
            },
        )
        .await
        .expect("moved to Brno");
    assert_eq!(harness.gateway.targets(), vec![token.endpoint_arn.clone()]);

    let err = harness
        .events()
        .update(
            &id,
            EventPatch {
                city_id: Some(Some(brno.id)),
                ..EventPatch::default()
            },
        )
        .await
        .expect_err("same city");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(harness.gateway.published().len(), 1);

    harness
        .events()
        .update(
            &id,
            EventPatch {
                city_id: Some(None),
                ..EventPatch::default()
            },
        )
        .await
        .expect("made global");
    assert_eq!(harness.gateway.topic_publishes(), 1);
    assert_eq!(harness.gateway.published().len(), 2);
}

#[rstest]
#[tokio::test]
async fn removing_an_event_drops_its_registrations(harness: TestHarness) {
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Global ride", None).await;
    harness
        .registrations(harness.visibility())
        .register(&rider, &id, true)
        .await
        .expect("registered");
    assert_eq!(harness.store.registrations_for(&id).len(), 1);

    let listing = harness.events().remove(&id).await.expect("removed");
    assert!(listing.iter().all(|row| row.event.id != id));
    assert!(harness.store.registrations_for(&id).is_empty());

    let err = harness
        .events()
        .remove(&id)
        .await
        .expect_err("already gone");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
