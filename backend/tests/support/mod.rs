//! Shared builders for the backend integration tests.
//!
//! Each file under `backend/tests/` compiles this module into its own crate;
//! every crate that declares `mod support;` uses every helper below.

use chrono::{DateTime, TimeDelta, Utc};
use fleet_backend::domain::ports::CityCommand;
use fleet_backend::domain::{City, CityId, GeoPoint, NewCity, NewEvent};
use fleet_backend::test_support::TestHarness;
use mockable::Clock;

/// Centre of Prague.
pub fn prague_centre() -> GeoPoint {
    GeoPoint::new(14.42076, 50.08804).expect("Prague coordinates")
}

/// Centre of Brno.
pub fn brno_centre() -> GeoPoint {
    GeoPoint::new(16.60796, 49.19522).expect("Brno coordinates")
}

pub fn new_city(name: &str, location: GeoPoint) -> NewCity {
    NewCity {
        name: name.to_owned(),
        location,
        radius_m: None,
        image_url: None,
    }
}

/// Register a city through the registry.
pub async fn register_city(harness: &TestHarness, name: &str, location: GeoPoint) -> City {
    harness
        .cities()
        .register(new_city(name, location))
        .await
        .expect("city registers")
}

/// "Now" as seen by every service in `harness`.
pub fn now(harness: &TestHarness) -> DateTime<Utc> {
    harness.clock.utc()
}

/// A one-hour event starting `days_ahead` days from the harness clock.
pub fn event_in(
    harness: &TestHarness,
    name: &str,
    city_id: Option<CityId>,
    days_ahead: i64,
) -> NewEvent {
    let start_date = now(harness) + TimeDelta::days(days_ahead);
    NewEvent {
        name: name.to_owned(),
        description: format!("{name} description"),
        start_date,
        end_date: start_date + TimeDelta::hours(1),
        city_id,
        location: "Old Town Square".to_owned(),
        image_url: None,
        link: None,
    }
}
