//! City entities and great-circle geometry.
//!
//! Cities anchor location-based events. A city has a centre point and a
//! radius in metres; a point "belongs" to a city when it lies within that
//! radius. Timezones are resolved once at registration and never change.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Stable city identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(Uuid);

impl CityId {
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

impl From<Uuid> for CityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Validation errors for [`GeoPoint`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoPointError {
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude must be within [-180, 180], got {0}")]
    Longitude(f64),
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude must be within [-90, 90], got {0}")]
    Latitude(f64),
}

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

impl GeoPoint {
    /// Validate and build a point.
    ///
    /// # Examples
    /// ```
    /// use fleet_backend::domain::GeoPoint;
    ///
    /// let prague = GeoPoint::new(14.42076, 50.08804).expect("valid point");
    /// assert!(GeoPoint::new(200.0, 0.0).is_err());
    /// # let _ = prague;
    /// ```
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoPointError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::Longitude(longitude));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::Latitude(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Haversine distance in metres.
    #[must_use]
    pub fn distance_m(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// A registered city.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    /// Stable identifier.
    pub id: CityId,
    /// Unique display name.
    pub name: String,
    /// Centre point.
    pub location: GeoPoint,
    /// Catchment radius in metres.
    pub radius_m: u32,
    /// IANA timezone resolved from `location` at registration.
    pub timezone: String,
    /// Fallback image for events held in the city.
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl City {
    /// Whether `point` falls inside the city's radius.
    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.location.distance_m(point) <= f64::from(self.radius_m)
    }
}

/// Input for registering a city.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCity {
    /// Unique display name.
    pub name: String,
    /// Centre point.
    pub location: GeoPoint,
    /// Radius in metres; defaults from configuration when absent.
    pub radius_m: Option<u32>,
    /// Optional fallback image for events.
    pub image_url: Option<String>,
}

/// Partial update for a city. The timezone is not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityPatch {
    /// New name, checked for uniqueness against other cities.
    pub name: Option<String>,
    /// New centre point.
    pub location: Option<GeoPoint>,
    /// New radius in metres.
    pub radius_m: Option<u32>,
    /// `Some(None)` clears the image, `None` leaves it untouched.
    pub image_url: Option<Option<String>>,
}

impl CityPatch {
    /// Apply the patch, returning the updated city.
    #[must_use]
    pub fn apply(self, mut city: City, now: DateTime<Utc>) -> City {
        if let Some(name) = self.name {
            city.name = name;
        }
        if let Some(location) = self.location {
            city.location = location;
        }
        if let Some(radius_m) = self.radius_m {
            city.radius_m = radius_m;
        }
        if let Some(image_url) = self.image_url {
            city.image_url = image_url;
        }
        city.updated_at = now;
        city
    }
}

/// An active user-to-city subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySubscription {
    /// Subscribed user.
    pub user_id: UserId,
    /// Subscribed city.
    pub city_id: CityId,
    /// When the subscription was (re)created.
    pub created_at: DateTime<Utc>,
}

/// Subscriber count for one city; zero-subscriber cities are included.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySubscriptionSummary {
    /// The city.
    pub city: City,
    /// Number of active subscriptions.
    pub subscriber_count: u64,
}

/// Order cities by distance to `origin`, nearest first, ties broken by name.
pub fn sort_by_distance(cities: &mut [City], origin: &GeoPoint) {
    cities.sort_by(|a, b| {
        a.location
            .distance_m(origin)
            .partial_cmp(&b.location.distance_m(origin))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Order cities alphabetically by name.
pub fn sort_by_name(cities: &mut [City]) {
    cities.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Nearest city whose radius contains `point`.
#[must_use]
pub fn nearest_containing<'a, I>(cities: I, point: &GeoPoint) -> Option<&'a City>
where
    I: IntoIterator<Item = &'a City>,
{
    cities
        .into_iter()
        .filter(|city| city.contains(point))
        .min_by(|a, b| {
            a.location
                .distance_m(point)
                .partial_cmp(&b.location.distance_m(point))
                .unwrap_or(Ordering::Equal)
        })
}
