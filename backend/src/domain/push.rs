//! Push notification primitives.
//!
//! Devices register a push token, which the gateway turns into a platform
//! endpoint. Endpoints are subscribed to one broadcast topic for global
//! events and addressed individually for city events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{Error, EventCity, EventPublication, UserId};

macro_rules! arn_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Wrap a provider-issued ARN.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw ARN.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

arn_newtype!(
    /// ARN of a single device endpoint.
    EndpointArn
);
arn_newtype!(
    /// ARN of a broadcast topic.
    TopicArn
);
arn_newtype!(
    /// ARN of an endpoint-to-topic subscription.
    SubscriptionArn
);
arn_newtype!(
    /// ARN of a platform application (one per mobile platform).
    PlatformApplicationArn
);

/// Stored push token identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PushTokenId(Uuid);

impl PushTokenId {
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

impl From<Uuid> for PushTokenId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PushTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target mobile platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPlatform {
    /// Firebase-delivered Android devices.
    Android,
    /// APNs-delivered iOS devices.
    Ios,
}

impl PushPlatform {
    /// Android clients send a device id alongside their token; iOS clients do not.
    #[must_use]
    pub const fn for_device(device_id: Option<&str>) -> Self {
        match device_id {
            Some(_) => Self::Android,
            None => Self::Ios,
        }
    }
}

/// A device push token known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushToken {
    /// Stable identifier.
    pub id: PushTokenId,
    /// Owning user.
    pub user_id: UserId,
    /// Raw provider token.
    pub token: String,
    /// Android device id, when reported.
    pub device_id: Option<String>,
    /// Platform endpoint created for the token.
    pub endpoint_arn: EndpointArn,
    /// Cleared once the gateway reports the endpoint as disabled.
    pub enabled: bool,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// An enabled endpoint selected for a city broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEndpoint {
    /// Token the endpoint belongs to.
    pub token_id: PushTokenId,
    /// Endpoint to publish to.
    pub endpoint_arn: EndpointArn,
}

/// Bookkeeping for a topic subscription tied to a push token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSubscription {
    /// Owning user.
    pub user_id: UserId,
    /// Token that was subscribed.
    pub push_token_id: PushTokenId,
    /// Provider subscription.
    pub arn: SubscriptionArn,
}

/// A single publish call.
///
/// ## Invariants
/// - Exactly one of `topic_arn` and `target_arn` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    topic_arn: Option<TopicArn>,
    target_arn: Option<EndpointArn>,
    message: String,
}

impl PublishRequest {
    /// Validate the destination pair.
    ///
    /// Supplying both destinations, or neither, is a wiring bug and yields an
    /// internal error.
    pub fn try_new(
        topic_arn: Option<TopicArn>,
        target_arn: Option<EndpointArn>,
        message: String,
    ) -> Result<Self, Error> {
        match (&topic_arn, &target_arn) {
            (Some(_), None) | (None, Some(_)) => Ok(Self {
                topic_arn,
                target_arn,
                message,
            }),
            _ => Err(Error::internal(
                "publish requires exactly one of topic ARN or target ARN",
            )),
        }
    }

    /// Broadcast to a topic.
    #[must_use]
    pub const fn to_topic(topic_arn: TopicArn, message: String) -> Self {
        Self {
            topic_arn: Some(topic_arn),
            target_arn: None,
            message,
        }
    }

    /// Deliver to one endpoint.
    #[must_use]
    pub const fn to_target(target_arn: EndpointArn, message: String) -> Self {
        Self {
            topic_arn: None,
            target_arn: Some(target_arn),
            message,
        }
    }

    /// Topic destination, if any.
    #[must_use]
    pub const fn topic_arn(&self) -> Option<&TopicArn> {
        self.topic_arn.as_ref()
    }

    /// Endpoint destination, if any.
    #[must_use]
    pub const fn target_arn(&self) -> Option<&EndpointArn> {
        self.target_arn.as_ref()
    }

    /// Provider message body (a JSON document keyed by platform).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn city_summary(city: Option<&EventCity>) -> Value {
    city.map_or(Value::Null, |city| {
        json!({
            "id": city.id.to_string(),
            "name": city.name,
            "location": {
                "longitude": city.location.longitude(),
                "latitude": city.location.latitude(),
            },
        })
    })
}

fn encode(value: &Value) -> Result<String, Error> {
    serde_json::to_string(value)
        .map_err(|err| Error::internal(format!("failed to encode push payload: {err}")))
}

/// Build the per-platform message document for an event publication.
///
/// The result is a JSON object with `default`, `GCM` and `APNS` keys whose
/// platform values are themselves JSON-encoded strings, as expected by
/// gateways publishing with a JSON message structure.
pub fn build_event_message(publication: &EventPublication) -> Result<String, Error> {
    let event = &publication.event;
    let data = json!({
        "type": "event",
        "eventId": event.id.to_string(),
        "name": event.name,
        "description": event.description,
        "startDate": event.start_date.to_rfc3339(),
        "endDate": event.end_date.to_rfc3339(),
        "imageUrl": publication.image_url,
        "city": city_summary(publication.city.as_ref()),
    });

    let gcm = json!({
        "notification": {
            "title": event.name,
            "body": event.description,
            "image": publication.image_url,
        },
        "data": data,
    });
    let apns = json!({
        "aps": {
            "alert": { "title": event.name, "body": event.description },
            "mutable-content": 1,
            "sound": "default",
        },
        "data": data,
    });
    let apns = encode(&apns)?;

    encode(&json!({
        "default": event.name,
        "GCM": encode(&gcm)?,
        "APNS": apns.clone(),
        "APNS_SANDBOX": apns,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CityId, ErrorCode, GeoPoint, NewEvent};
    use chrono::{Duration, Utc};
    use rstest::rstest;

    fn publication(city: Option<EventCity>) -> EventPublication {
        let now = Utc::now();
        let event = NewEvent {
            name: "Meetup".into(),
            description: "Evening ride".into(),
            start_date: now + Duration::days(1),
            end_date: now + Duration::days(1) + Duration::hours(1),
            city_id: city.as_ref().map(|c| c.id),
            location: "Letna".into(),
            image_url: None,
            link: None,
        }
        .into_event(now);
        EventPublication {
            event,
            city,
            image_url: "https://img.test/fallback.png".into(),
        }
    }

    #[rstest]
    #[case::both(true, true)]
    #[case::neither(false, false)]
    fn rejects_ambiguous_destinations(#[case] topic: bool, #[case] target: bool) {
        let err = PublishRequest::try_new(
            topic.then(|| TopicArn::new("arn:topic")),
            target.then(|| EndpointArn::new("arn:endpoint")),
            "{}".into(),
        )
        .expect_err("exactly one destination required");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[rstest]
    fn accepts_single_destination() {
        let request =
            PublishRequest::try_new(None, Some(EndpointArn::new("arn:endpoint")), "{}".into())
                .expect("target only");
        assert_eq!(request.target_arn().map(EndpointArn::as_str), Some("arn:endpoint"));
        assert!(request.topic_arn().is_none());
    }

    #[rstest]
    #[case(Some("device-1"), PushPlatform::Android)]
    #[case(None, PushPlatform::Ios)]
    fn platform_follows_device_id(#[case] device: Option<&str>, #[case] expected: PushPlatform) {
        assert_eq!(PushPlatform::for_device(device), expected);
    }

    #[rstest]
    fn message_has_platform_branches_with_event_data() {
        let city = EventCity {
            id: CityId::random(),
            name: "Prague".into(),
            location: GeoPoint::new(14.42076, 50.08804).expect("point"),
            timezone: "Europe/Prague".into(),
            image_url: None,
        };
        let publication = publication(Some(city));
        let message = build_event_message(&publication).expect("payload");
        let document: Value = serde_json::from_str(&message).expect("outer json");

        assert_eq!(document["default"], "Meetup");
        let gcm: Value =
            serde_json::from_str(document["GCM"].as_str().expect("gcm string")).expect("gcm json");
        assert_eq!(gcm["data"]["eventId"], publication.event.id.to_string());
        assert_eq!(gcm["data"]["city"]["name"], "Prague");
        let apns: Value =
            serde_json::from_str(document["APNS"].as_str().expect("apns string")).expect("apns");
        assert_eq!(apns["aps"]["alert"]["title"], "Meetup");
        assert_eq!(apns["data"]["imageUrl"], "https://img.test/fallback.png");
    }

    #[rstest]
    fn global_events_carry_null_city() {
        let message = build_event_message(&publication(None)).expect("payload");
        let document: Value = serde_json::from_str(&message).expect("outer json");
        let gcm: Value =
            serde_json::from_str(document["GCM"].as_str().expect("gcm string")).expect("gcm json");
        assert!(gcm["data"]["city"].is_null());
    }
}
