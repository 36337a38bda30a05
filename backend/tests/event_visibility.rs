//! Visibility, attendance and read-state laws across the event services.

use chrono::TimeDelta;
use fleet_backend::domain::ports::{
    EventCommand, EventVisibilityQuery, InboxQuery, MessageInteractionCommand,
    RegistrationCommand, SubscriptionCommand,
};
use fleet_backend::domain::{
    BoardFirmwareNotice, CityId, ErrorCode, EventId, InboxService, MessageState, MessageTarget,
    StoredMessageState, UserEvent, UserId, UserRole,
};
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

async fn visible(harness: &TestHarness, user: &UserId) -> Vec<UserEvent> {
    harness
        .visibility()
        .upcoming_events_with_going_status(user)
        .await
        .expect("visible events")
}

fn find(events: &[UserEvent], id: EventId) -> Option<&UserEvent> {
    events.iter().find(|row| row.event.id == id)
}

#[rstest]
#[tokio::test]
async fn attendance_outlives_the_subscription_it_required(harness: TestHarness) {
    let prague = register_city(&harness, "Prague", prague_centre()).await;
    let brno = register_city(&harness, "Brno", brno_centre()).await;
    let rider = harness.grant("rider", UserRole::User);
    let subscriptions = harness.subscriptions();
    let registrations = harness.registrations(harness.visibility());
    subscriptions
        .subscribe(&rider, &prague.id)
        .await
        .expect("subscribed to Prague");

    let e1 = register_event(&harness, "Prague ride", Some(prague.id)).await;
    let e2 = register_event(&harness, "Brno ride", Some(brno.id)).await;

    let events = visible(&harness, &rider).await;
    let first = find(&events, e1).expect("subscribed city event is visible");
    assert_eq!(first.going, None);
    assert_eq!(first.message_state, MessageState::New);
    assert!(find(&events, e2).is_none());

    let err = registrations
        .register(&rider, &e2, true)
        .await
        .expect_err("outside subscribed cities");
    assert_eq!(err.code(), ErrorCode::NotFound);

    subscriptions
        .subscribe(&rider, &brno.id)
        .await
        .expect("subscribed to Brno");
    let answered = registrations
        .register(&rider, &e2, true)
        .await
        .expect("registered");
    assert_eq!(answered.going, Some(true));
    subscriptions
        .unsubscribe(&rider, &brno.id)
        .await
        .expect("unsubscribed from Brno");

    let events = visible(&harness, &rider).await;
    let retained = find(&events, e2).expect("attended event stays visible");
    assert_eq!(retained.going, Some(true));
}

#[rstest]
#[tokio::test]
async fn re_answering_updates_the_registration_in_place(harness: TestHarness) {
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Global ride", None).await;
    let registrations = harness.registrations(harness.visibility());

    registrations
        .register(&rider, &id, true)
        .await
        .expect("going");
    let answered = registrations
        .register(&rider, &id, false)
        .await
        .expect("not going");

    assert_eq!(answered.going, Some(false));
    let stored = harness.store.registrations_for(&id);
    assert_eq!(stored.len(), 1);
    assert!(stored.iter().all(|row| !row.going));
}

#[rstest]
#[tokio::test]
async fn message_state_is_one_row_per_event(harness: TestHarness) {
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Global ride", None).await;
    let interactions = harness.interactions(harness.visibility());
    let target = MessageTarget::Event { event_id: id };

    for _ in 0..2 {
        interactions
            .interact_with_message(&rider, target, StoredMessageState::Seen)
            .await
            .expect("seen");
    }
    assert_eq!(
        harness.store.interaction_rows(&rider),
        vec![(id, StoredMessageState::Seen)]
    );

    interactions
        .interact_with_message(&rider, target, StoredMessageState::Deleted)
        .await
        .expect("deleted");
    assert_eq!(
        harness.store.interaction_rows(&rider),
        vec![(id, StoredMessageState::Deleted)]
    );
}

#[rstest]
#[tokio::test]
async fn hidden_events_cannot_be_marked(harness: TestHarness) {
    let brno = register_city(&harness, "Brno", brno_centre()).await;
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Brno ride", Some(brno.id)).await;

    let err = harness
        .interactions(harness.visibility())
        .interact_with_message(
            &rider,
            MessageTarget::Event { event_id: id },
            StoredMessageState::Seen,
        )
        .await
        .expect_err("not visible");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(harness.store.interaction_rows(&rider).is_empty());
}

#[rstest]
#[tokio::test]
async fn reading_a_single_event_marks_it_seen(harness: TestHarness) {
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Global ride", None).await;
    let visibility = harness.visibility();

    let peeked = visibility
        .single_event_for_user(&rider, &id, false)
        .await
        .expect("visible");
    assert_eq!(peeked.message_state, MessageState::New);

    let read = visibility
        .single_event_for_user(&rider, &id, true)
        .await
        .expect("visible");
    assert_eq!(read.message_state, MessageState::Seen);
    assert_eq!(
        harness.store.interaction_rows(&rider),
        vec![(id, StoredMessageState::Seen)]
    );
}

#[rstest]
#[tokio::test]
async fn events_drop_out_a_day_after_they_end(harness: TestHarness) {
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Global ride", None).await;

    harness.clock.advance(TimeDelta::days(2));
    assert!(find(&visible(&harness, &rider).await, id).is_some());

    harness.clock.advance(TimeDelta::hours(2));
    assert!(find(&visible(&harness, &rider).await, id).is_none());
    let err = harness
        .visibility()
        .single_event_for_user(&rider, &id, false)
        .await
        .expect_err("expired");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn answering_an_ended_event_stores_nothing(harness: TestHarness) {
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Global ride", None).await;
    harness.clock.advance(TimeDelta::days(5));

    let err = harness
        .registrations(harness.visibility())
        .register(&rider, &id, true)
        .await
        .expect_err("event has ended");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(harness.store.registrations_for(&id).is_empty());
}

#[rstest]
#[tokio::test]
async fn inbox_pairs_events_with_outdated_boards(harness: TestHarness) {
    let rider = harness.grant("rider", UserRole::User);
    let id = register_event(&harness, "Global ride", None).await;
    let board = BoardFirmwareNotice {
        serial_number: "FB-0042".to_owned(),
        current_version: Some("1.2.0".to_owned()),
        latest_version: "1.3.0".to_owned(),
    };
    harness.store.add_boards(&rider, vec![board.clone()]);

    let inbox = InboxService::new(harness.visibility(), harness.store.clone())
        .inbox(&rider)
        .await
        .expect("inbox");
    assert_eq!(
        inbox.events.iter().map(|row| row.event.id).collect::<Vec<_>>(),
        vec![id]
    );
    assert_eq!(inbox.boards, vec![board]);
}
