//! Events and their storage/wire shapes.
//!
//! An event optionally belongs to a city; events without a city are global
//! and reach every user. `published_at` moves forward whenever the event's
//! city assignment changes, which is also what re-triggers notifications.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{City, CityId, Error, GeoPoint, UserId};

/// Stable event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for EventId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Call-to-action link. Text and URL are present or absent together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLink {
    /// Label shown to the user.
    pub text: String,
    /// Target URL.
    pub url: String,
}

impl EventLink {
    /// Fold the flat storage columns into the nested link.
    ///
    /// A half-populated pair is treated as no link.
    ///
    /// # Examples
    /// ```
    /// use fleet_backend::domain::EventLink;
    ///
    /// let link = EventLink::from_columns(Some("Join".into()), Some("https://x.test".into()));
    /// assert!(link.is_some());
    /// assert!(EventLink::from_columns(Some("Join".into()), None).is_none());
    /// ```
    #[must_use]
    pub fn from_columns(text: Option<String>, url: Option<String>) -> Option<Self> {
        match (text, url) {
            (Some(text), Some(url)) => Some(Self { text, url }),
            _ => None,
        }
    }

    /// Split an optional link into `(link_text, link_url)` columns.
    #[must_use]
    pub fn into_columns(link: Option<Self>) -> (Option<String>, Option<String>) {
        match link {
            Some(Self { text, url }) => (Some(text), Some(url)),
            None => (None, None),
        }
    }
}

/// City fields folded into an event read.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCity {
    /// City identifier.
    pub id: CityId,
    /// City name.
    pub name: String,
    /// City centre.
    pub location: GeoPoint,
    /// City timezone.
    pub timezone: String,
    /// City fallback image.
    pub image_url: Option<String>,
}

impl From<&City> for EventCity {
    fn from(city: &City) -> Self {
        Self {
            id: city.id,
            name: city.name.clone(),
            location: city.location,
            timezone: city.timezone.clone(),
            image_url: city.image_url.clone(),
        }
    }
}

/// A user's going/not-going answer for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRegistration {
    /// Responding user.
    pub user_id: UserId,
    /// Event answered.
    pub event_id: EventId,
    /// `true` when attending.
    pub going: bool,
    /// First answer time.
    pub created_at: DateTime<Utc>,
    /// Last change time.
    pub updated_at: DateTime<Utc>,
}

/// A stored event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Stable identifier.
    pub id: EventId,
    /// Title.
    pub name: String,
    /// Body text.
    pub description: String,
    /// Start of the event window.
    pub start_date: DateTime<Utc>,
    /// End of the event window; always after `start_date`.
    pub end_date: DateTime<Utc>,
    /// Owning city; `None` for global events.
    pub city_id: Option<CityId>,
    /// Free-form venue text.
    pub location: String,
    /// Event image; falls back to the city image, then configuration.
    pub image_url: Option<String>,
    /// Optional call-to-action link.
    pub link: Option<EventLink>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Last (re)publication timestamp; drives inbox ordering.
    pub published_at: DateTime<Utc>,
}

impl Event {
    /// Uniqueness key for this event.
    #[must_use]
    pub fn key(&self) -> EventKey {
        EventKey {
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            city_id: self.city_id,
        }
    }

    /// Whether the event has no city.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.city_id.is_none()
    }
}

/// The tuple that must be unique across events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    /// Title.
    pub name: String,
    /// Start of the window.
    pub start_date: DateTime<Utc>,
    /// End of the window.
    pub end_date: DateTime<Utc>,
    /// Owning city; `None` compares equal to `None`.
    pub city_id: Option<CityId>,
}

/// Input for registering an event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Title.
    pub name: String,
    /// Body text.
    pub description: String,
    /// Start of the event window.
    pub start_date: DateTime<Utc>,
    /// End of the event window.
    pub end_date: DateTime<Utc>,
    /// Owning city; `None` for a global event.
    pub city_id: Option<CityId>,
    /// Free-form venue text.
    pub location: String,
    /// Optional explicit image.
    pub image_url: Option<String>,
    /// Optional call-to-action link.
    pub link: Option<EventLink>,
}

impl NewEvent {
    /// Materialise the event with fresh identity and timestamps.
    #[must_use]
    pub fn into_event(self, now: DateTime<Utc>) -> Event {
        Event {
            id: EventId::random(),
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            city_id: self.city_id,
            location: self.location,
            image_url: self.image_url,
            link: self.link,
            created_at: now,
            updated_at: now,
            published_at: now,
        }
    }
}

/// Partial update for an event.
///
/// Double options distinguish "leave alone" (`None`) from "set to null"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    /// New title.
    pub name: Option<String>,
    /// New body text.
    pub description: Option<String>,
    /// New start.
    pub start_date: Option<DateTime<Utc>>,
    /// New end.
    pub end_date: Option<DateTime<Utc>>,
    /// City reassignment; must differ from the current city.
    pub city_id: Option<Option<CityId>>,
    /// New venue text.
    pub location: Option<String>,
    /// Image change.
    pub image_url: Option<Option<String>>,
    /// Link change.
    pub link: Option<Option<EventLink>>,
}

impl EventPatch {
    /// Effective window after applying the patch to `event`.
    #[must_use]
    pub fn effective_window(&self, event: &Event) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_date.unwrap_or(event.start_date),
            self.end_date.unwrap_or(event.end_date),
        )
    }

    /// Apply every field except the city, which the registry handles itself.
    #[must_use]
    pub fn apply(self, mut event: Event, now: DateTime<Utc>) -> Event {
        if let Some(name) = self.name {
            event.name = name;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(start_date) = self.start_date {
            event.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(image_url) = self.image_url {
            event.image_url = image_url;
        }
        if let Some(link) = self.link {
            event.link = link;
        }
        event.updated_at = now;
        event
    }
}

/// Check the temporal invariants of an event window.
///
/// `start_date` must precede `end_date`. When `check_not_past` is set the
/// start may not fall on a UTC calendar day before `now`.
pub fn validate_window(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    now: DateTime<Utc>,
    check_not_past: bool,
) -> Result<(), Error> {
    if check_not_past && start_date.date_naive() < now.date_naive() {
        return Err(
            Error::invalid_request("event start date must not be in the past").with_details(
                serde_json::json!({ "field": "startDate", "code": "start_in_past" }),
            ),
        );
    }
    if start_date >= end_date {
        return Err(
            Error::invalid_request("event start date must be before its end date").with_details(
                serde_json::json!({ "field": "startDate", "code": "start_not_before_end" }),
            ),
        );
    }
    Ok(())
}

/// Resolve the image shown for an event.
#[must_use]
pub fn effective_image_url(
    event_image: Option<&str>,
    city_image: Option<&str>,
    fallback: &str,
) -> String {
    event_image.or(city_image).unwrap_or(fallback).to_owned()
}

/// Event row with attendance aggregates for back-office listings.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminEvent {
    /// The event.
    pub event: Event,
    /// Folded city, if any.
    pub city: Option<EventCity>,
    /// Registrations with `going = true`.
    pub attending_count: u64,
    /// Registrations with `going = false`.
    pub rejected_count: u64,
    /// Active subscribers of the event's city, or all users for global events.
    pub subscriber_count: u64,
}

/// Event plus the context the notification fan-out needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPublication {
    /// The published event.
    pub event: Event,
    /// Target city; `None` means a topic-wide broadcast.
    pub city: Option<EventCity>,
    /// Image after fallback resolution.
    pub image_url: String,
}
