//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Float8, Nullable, Text, Timestamptz, Uuid as SqlUuid};
use uuid::Uuid;

use crate::domain::{
    AdminEvent, City, CityId, EndpointArn, Event, EventCity, EventId, EventLink, GeoPoint,
    MessageState, PushToken, PushTokenId, StoredMessageState, UserEvent, UserId,
};

use super::schema::{
    cities, city_subscriptions, event_registrations, events, message_interactions,
    push_subscription_arns, push_tokens, users,
};

/// Cast the stored radius back to the domain type.
#[expect(
    clippy::cast_sign_loss,
    reason = "radius_m is constrained to positive values by the schema"
)]
pub(crate) fn radius_from_db(radius_m: i32) -> u32 {
    radius_m as u32
}

/// Cast the domain radius for storage, saturating at `i32::MAX`.
pub(crate) fn radius_for_db(radius_m: u32) -> i32 {
    i32::try_from(radius_m).unwrap_or(i32::MAX)
}

/// Cast a `COUNT(*)` result to the domain counter type.
#[expect(
    clippy::cast_sign_loss,
    reason = "COUNT(*) is never negative"
)]
pub(crate) fn count_from_db(count: i64) -> u64 {
    count as u64
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Cities
// ---------------------------------------------------------------------------

/// Row struct for reading from the cities table.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = cities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CityRow {
    pub id: Uuid,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub radius_m: i32,
    pub timezone: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CityRow> for City {
    type Error = String;

    fn try_from(row: CityRow) -> Result<Self, Self::Error> {
        let location = GeoPoint::new(row.longitude, row.latitude)
            .map_err(|err| format!("city {} has invalid coordinates: {err}", row.id))?;
        Ok(Self {
            id: CityId::from(row.id),
            name: row.name,
            location,
            radius_m: radius_from_db(row.radius_m),
            timezone: row.timezone,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable and changeset struct for city records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = cities)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CityRecord<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub longitude: f64,
    pub latitude: f64,
    pub radius_m: i32,
    pub timezone: &'a str,
    pub image_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a City> for CityRecord<'a> {
    fn from(city: &'a City) -> Self {
        Self {
            id: *city.id.as_uuid(),
            name: &city.name,
            longitude: city.location.longitude(),
            latitude: city.location.latitude(),
            radius_m: radius_for_db(city.radius_m),
            timezone: &city.timezone,
            image_url: city.image_url.as_deref(),
            created_at: city.created_at,
            updated_at: city.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// City subscriptions
// ---------------------------------------------------------------------------

/// Row struct for reading from the city_subscriptions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = city_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CitySubscriptionRow {
    pub user_id: Uuid,
    pub city_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// City with its active subscriber count.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct CitySummaryRow {
    #[diesel(embed)]
    pub city: CityRow,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub subscriber_count: i64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Row struct for reading from the events table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub city_id: Option<Uuid>,
    pub location: String,
    pub image_url: Option<String>,
    pub link_text: Option<String>,
    pub link_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from(row.id),
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            city_id: row.city_id.map(CityId::from),
            location: row.location,
            image_url: row.image_url,
            link: EventLink::from_columns(row.link_text, row.link_url),
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        }
    }
}

/// Insertable and changeset struct for event records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = events)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct EventRecord<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub city_id: Option<Uuid>,
    pub location: &'a str,
    pub image_url: Option<&'a str>,
    pub link_text: Option<&'a str>,
    pub link_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
}

impl<'a> From<&'a Event> for EventRecord<'a> {
    fn from(event: &'a Event) -> Self {
        let (link_text, link_url) = event
            .link
            .as_ref()
            .map_or((None, None), |link| (Some(link.text.as_str()), Some(link.url.as_str())));
        Self {
            id: *event.id.as_uuid(),
            name: &event.name,
            description: &event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            city_id: event.city_id.map(|id| *id.as_uuid()),
            location: &event.location,
            image_url: event.image_url.as_deref(),
            link_text,
            link_url,
            created_at: event.created_at,
            updated_at: event.updated_at,
            published_at: event.published_at,
        }
    }
}

/// Select list matching [`EventWithCityRow`] for raw queries over
/// `events e LEFT JOIN cities c`.
pub(crate) const EVENT_WITH_CITY_COLUMNS: &str = "\
    e.id, e.name, e.description, e.start_date, e.end_date, e.city_id, e.location, \
    e.image_url, e.link_text, e.link_url, e.created_at, e.updated_at, e.published_at, \
    c.name AS city_name, c.longitude AS city_longitude, c.latitude AS city_latitude, \
    c.timezone AS city_timezone, c.image_url AS city_image_url";

/// Event columns joined with the owning city, shared by the admin and
/// per-user read models.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct EventWithCityRow {
    #[diesel(sql_type = SqlUuid)]
    pub id: Uuid,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub description: String,
    #[diesel(sql_type = Timestamptz)]
    pub start_date: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub end_date: DateTime<Utc>,
    #[diesel(sql_type = Nullable<SqlUuid>)]
    pub city_id: Option<Uuid>,
    #[diesel(sql_type = Text)]
    pub location: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub image_url: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub link_text: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub link_url: Option<String>,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub published_at: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Text>)]
    pub city_name: Option<String>,
    #[diesel(sql_type = Nullable<Float8>)]
    pub city_longitude: Option<f64>,
    #[diesel(sql_type = Nullable<Float8>)]
    pub city_latitude: Option<f64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub city_timezone: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub city_image_url: Option<String>,
}

impl EventWithCityRow {
    /// Split into the event and its optional city projection.
    pub(crate) fn into_parts(self) -> Result<(Event, Option<EventCity>), String> {
        let city = match (
            self.city_id,
            self.city_name,
            self.city_longitude,
            self.city_latitude,
            self.city_timezone,
        ) {
            (Some(id), Some(name), Some(longitude), Some(latitude), Some(timezone)) => {
                let location = GeoPoint::new(longitude, latitude)
                    .map_err(|err| format!("city {id} has invalid coordinates: {err}"))?;
                Some(EventCity {
                    id: CityId::from(id),
                    name,
                    location,
                    timezone,
                    image_url: self.city_image_url,
                })
            }
            (None, ..) => None,
            (Some(id), ..) => return Err(format!("event {} references missing city {id}", self.id)),
        };
        let event = Event::from(EventRow {
            id: self.id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            city_id: self.city_id,
            location: self.location,
            image_url: self.image_url,
            link_text: self.link_text,
            link_url: self.link_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
            published_at: self.published_at,
        });
        Ok((event, city))
    }
}

/// Admin listing row: event, city and attendance aggregates.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct AdminEventRow {
    #[diesel(embed)]
    pub event: EventWithCityRow,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub attending_count: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub rejected_count: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub subscriber_count: i64,
}

impl TryFrom<AdminEventRow> for AdminEvent {
    type Error = String;

    fn try_from(row: AdminEventRow) -> Result<Self, Self::Error> {
        let (event, city) = row.event.into_parts()?;
        Ok(Self {
            event,
            city,
            attending_count: count_from_db(row.attending_count),
            rejected_count: count_from_db(row.rejected_count),
            subscriber_count: count_from_db(row.subscriber_count),
        })
    }
}

/// Per-user visibility row: event, city, answer and read state.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct UserEventRow {
    #[diesel(embed)]
    pub event: EventWithCityRow,
    #[diesel(sql_type = Nullable<Bool>)]
    pub going: Option<bool>,
    #[diesel(sql_type = Nullable<Text>)]
    pub message_state: Option<String>,
}

impl TryFrom<UserEventRow> for UserEvent {
    type Error = String;

    fn try_from(row: UserEventRow) -> Result<Self, Self::Error> {
        let stored = match row.message_state.as_deref() {
            None => None,
            Some(value) => Some(
                StoredMessageState::from_column(value)
                    .ok_or_else(|| format!("unknown message state `{value}`"))?,
            ),
        };
        let (event, city) = row.event.into_parts()?;
        let image_url = event
            .image_url
            .clone()
            .or_else(|| city.as_ref().and_then(|city| city.image_url.clone()));
        Ok(Self {
            event,
            city,
            image_url,
            going: row.going,
            message_state: MessageState::from_stored(stored),
        })
    }
}

// ---------------------------------------------------------------------------
// Registrations and interactions
// ---------------------------------------------------------------------------

/// Row struct for reading from the event_registrations table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = event_registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRegistrationRow {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub going: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for message interactions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = message_interactions)]
pub(crate) struct NewMessageInteractionRow<'a> {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub state: &'a str,
}

// ---------------------------------------------------------------------------
// Push tokens
// ---------------------------------------------------------------------------

/// Row struct for the push_tokens table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = push_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PushTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub device_id: Option<String>,
    pub endpoint_arn: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PushTokenRow> for PushToken {
    fn from(row: PushTokenRow) -> Self {
        Self {
            id: PushTokenId::from(row.id),
            user_id: UserId::from_uuid(row.user_id),
            token: row.token,
            device_id: row.device_id,
            endpoint_arn: EndpointArn::new(row.endpoint_arn),
            enabled: row.enabled,
            created_at: row.created_at,
        }
    }
}

impl From<&PushToken> for PushTokenRow {
    fn from(token: &PushToken) -> Self {
        Self {
            id: *token.id.as_uuid(),
            user_id: *token.user_id.as_uuid(),
            token: token.token.clone(),
            device_id: token.device_id.clone(),
            endpoint_arn: token.endpoint_arn.as_str().to_owned(),
            enabled: token.enabled,
            created_at: token.created_at,
        }
    }
}

/// Row struct for the push_subscription_arns table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = push_subscription_arns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PushSubscriptionArnRow {
    pub push_token_id: Uuid,
    pub user_id: Uuid,
    pub arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn city_row(longitude: f64) -> CityRow {
        CityRow {
            id: Uuid::nil(),
            name: "Prague".into(),
            longitude,
            latitude: 50.08,
            radius_m: 15_000,
            timezone: "Europe/Prague".into(),
            image_url: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[rstest]
    fn city_row_converts_radius_and_location() {
        let city = City::try_from(city_row(14.42)).expect("valid row");
        assert_eq!(city.radius_m, 15_000);
        assert!((city.location.longitude() - 14.42).abs() < f64::EPSILON);
    }

    #[rstest]
    fn city_row_with_bad_coordinates_is_rejected() {
        let error = City::try_from(city_row(500.0)).expect_err("out of range");
        assert!(error.contains("invalid coordinates"));
    }

    #[rstest]
    #[case(u32::MAX, i32::MAX)]
    #[case(5_000, 5_000)]
    fn radius_saturates_for_storage(#[case] radius: u32, #[case] expected: i32) {
        assert_eq!(radius_for_db(radius), expected);
    }

    fn event_with_city_row(city_id: Option<Uuid>, city_name: Option<&str>) -> EventWithCityRow {
        EventWithCityRow {
            id: Uuid::nil(),
            name: "Night ride".into(),
            description: "Loop".into(),
            start_date: DateTime::<Utc>::UNIX_EPOCH,
            end_date: DateTime::<Utc>::UNIX_EPOCH,
            city_id,
            location: "Old Town".into(),
            image_url: None,
            link_text: Some("Join".into()),
            link_url: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            published_at: DateTime::<Utc>::UNIX_EPOCH,
            city_name: city_name.map(str::to_owned),
            city_longitude: city_name.map(|_| 14.42),
            city_latitude: city_name.map(|_| 50.08),
            city_timezone: city_name.map(|_| "Europe/Prague".to_owned()),
            city_image_url: city_name.map(|_| "https://img.test/prague.png".to_owned()),
        }
    }

    #[rstest]
    fn half_link_columns_fold_to_no_link() {
        let (event, city) = event_with_city_row(None, None).into_parts().expect("global");
        assert!(event.link.is_none());
        assert!(city.is_none());
    }

    #[rstest]
    fn missing_city_join_is_an_error() {
        let error = event_with_city_row(Some(Uuid::nil()), None)
            .into_parts()
            .expect_err("dangling city");
        assert!(error.contains("missing city"));
    }

    #[rstest]
    fn user_event_inherits_city_image() {
        let row = UserEventRow {
            event: event_with_city_row(Some(Uuid::nil()), Some("Prague")),
            going: Some(true),
            message_state: Some("seen".into()),
        };
        let user_event = UserEvent::try_from(row).expect("valid row");
        assert_eq!(
            user_event.image_url.as_deref(),
            Some("https://img.test/prague.png")
        );
        assert_eq!(user_event.message_state, MessageState::Seen);
        assert_eq!(user_event.going, Some(true));
    }

    #[rstest]
    fn unknown_message_state_is_rejected() {
        let row = UserEventRow {
            event: event_with_city_row(None, None),
            going: None,
            message_state: Some("archived".into()),
        };
        assert!(UserEvent::try_from(row).is_err());
    }
}
