//! City registry and subscription behaviour over the in-memory store.

use fleet_backend::domain::ports::{
    CityCommand, CityQuery, EventCommand, EventQuery, SubscriptionCommand, SubscriptionQuery,
};
use fleet_backend::domain::{CityPatch, ErrorCode, UserRole};
use fleet_backend::test_support::TestHarness;
use rstest::{fixture, rstest};

mod support;

use support::{brno_centre, event_in, new_city, prague_centre, register_city};

#[fixture]
fn harness() -> TestHarness {
    TestHarness::default()
}

#[rstest]
#[tokio::test]
async fn duplicate_city_names_conflict_and_keep_the_first(harness: TestHarness) {
    let first = register_city(&harness, "Prague", prague_centre()).await;

    let err = harness
        .cities()
        .register(new_city("Prague", brno_centre()))
        .await
        .expect_err("duplicate name");
    assert_eq!(err.code(), ErrorCode::Conflict);

    let stored = harness
        .cities()
        .get_by_id(&first.id)
        .await
        .expect("first city is still there");
    assert_eq!(stored, first);
}

#[rstest]
#[tokio::test]
async fn test_city_cannot_be_updated_or_removed(harness: TestHarness) {
    let cities = harness.cities();

    let update = cities
        .update(
            &harness.test_city_id,
            CityPatch {
                name: Some("Renamed".to_owned()),
                ..CityPatch::default()
            },
        )
        .await
        .expect_err("protected");
    assert_eq!(update.code(), ErrorCode::Forbidden);

    let remove = cities
        .remove(&harness.test_city_id)
        .await
        .expect_err("protected");
    assert_eq!(remove.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn city_with_events_cannot_be_removed_until_they_are_gone(harness: TestHarness) {
    let city = register_city(&harness, "Prague", prague_centre()).await;
    let rider = harness.grant("rider", UserRole::User);
    harness
        .subscriptions()
        .subscribe(&rider, &city.id)
        .await
        .expect("subscribed");
    let events = harness.events();
    let listing = events
        .register(event_in(&harness, "Meetup", Some(city.id), 1))
        .await
        .expect("event registered");
    let event_id = listing
        .first()
        .map(|row| row.event.id)
        .expect("listed event");

    assert_eq!(
        events
            .get_all_in_city(&city.id)
            .await
            .expect("events in city")
            .len(),
        1
    );
    let err = harness
        .cities()
        .remove(&city.id)
        .await
        .expect_err("city still referenced");
    assert_eq!(err.code(), ErrorCode::Conflict);

    events.remove(&event_id).await.expect("event removed");
    harness
        .cities()
        .remove(&city.id)
        .await
        .expect("city removed");
    assert_eq!(harness.store.subscription_rows_for_city(&city.id), 0);
}

#[rstest]
#[tokio::test]
async fn subscribing_twice_conflicts_and_lists_stay_alphabetical(harness: TestHarness) {
    let prague = register_city(&harness, "Prague", prague_centre()).await;
    let brno = register_city(&harness, "Brno", brno_centre()).await;
    let rider = harness.grant("rider", UserRole::User);
    let subscriptions = harness.subscriptions();

    subscriptions
        .subscribe(&rider, &prague.id)
        .await
        .expect("first subscription");
    let listed = subscriptions
        .subscribe(&rider, &brno.id)
        .await
        .expect("second subscription");
    let names: Vec<_> = listed.iter().map(|city| city.name.as_str()).collect();
    assert_eq!(names, ["Brno", "Prague"]);

    let err = subscriptions
        .subscribe(&rider, &prague.id)
        .await
        .expect_err("already subscribed");
    assert_eq!(err.code(), ErrorCode::Conflict);

    let remaining = subscriptions
        .unsubscribe(&rider, &prague.id)
        .await
        .expect("unsubscribed");
    assert_eq!(remaining, vec![brno.clone()]);

    let err = subscriptions
        .unsubscribe(&rider, &prague.id)
        .await
        .expect_err("nothing to remove");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let summaries = subscriptions.summaries().await.expect("summaries");
    let prague_count = summaries
        .iter()
        .find(|summary| summary.city.id == prague.id)
        .map(|summary| summary.subscriber_count);
    assert_eq!(prague_count, Some(0));
}

#[rstest]
#[tokio::test]
async fn nearest_containing_city_wins_and_test_city_is_hidden(harness: TestHarness) {
    let prague = register_city(&harness, "Prague", prague_centre()).await;
    register_city(&harness, "Brno", brno_centre()).await;
    let rider = harness.grant("rider", UserRole::User);
    let cities = harness.cities();

    let found = cities
        .city_at(prague_centre())
        .await
        .expect("lookup succeeds");
    assert_eq!(found.map(|city| city.id), Some(prague.id));

    let candidates = cities
        .possible_cities_to_subscribe(&rider, false, Some(brno_centre()))
        .await
        .expect("candidates");
    let names: Vec<_> = candidates.iter().map(|city| city.name.as_str()).collect();
    assert_eq!(names, ["Brno", "Prague"]);
    assert!(candidates.iter().all(|city| city.id != harness.test_city_id));
}
