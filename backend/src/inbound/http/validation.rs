//! Shared validation helpers for inbound HTTP adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, GeoPoint, GeoPointError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    BlankField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidCoordinate,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::BlankField => "blank_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidCoordinate => "invalid_coordinate",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_value_error(field: FieldName, message: &str, value: &str) -> Error {
    ValidationError::new(field.as_str(), message).with_value(ErrorCode::InvalidValue, value)
}

/// Reject empty or whitespace-only text, returning the trimmed value.
pub(crate) fn require_text(value: String, field: FieldName) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let field = field.as_str();
        return Err(ValidationError::new(field, format!("{field} must not be blank"))
            .with_code(ErrorCode::BlankField));
    }
    Ok(trimmed.to_owned())
}

/// Trim optional text, treating blank input as absent.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, value))
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

fn coordinate_error(error: &GeoPointError) -> Error {
    let (field, value) = match error {
        GeoPointError::Longitude(value) => ("longitude", value),
        GeoPointError::Latitude(value) => ("latitude", value),
    };
    ValidationError::new(field, error.to_string())
        .with_value(ErrorCode::InvalidCoordinate, value.to_string())
}

pub(crate) fn parse_geo_point(longitude: f64, latitude: f64) -> Result<GeoPoint, Error> {
    GeoPoint::new(longitude, latitude).map_err(|err| coordinate_error(&err))
}

/// Both halves of a coordinate, or neither.
pub(crate) fn parse_optional_geo_point(
    longitude: Option<f64>,
    latitude: Option<f64>,
) -> Result<Option<GeoPoint>, Error> {
    match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => parse_geo_point(longitude, latitude).map(Some),
        (None, None) => Ok(None),
        (Some(_), None) => Err(missing_field_error(FieldName::new("latitude"))),
        (None, Some(_)) => Err(missing_field_error(FieldName::new("longitude"))),
    }
}

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH payloads. Pair with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;
    use serde_json::Value;

    fn detail<'a>(error: &'a Error, key: &str) -> &'a Value {
        error
            .details()
            .and_then(|details| details.get(key))
            .expect("detail present")
    }

    #[rstest]
    fn blank_text_is_rejected() {
        let err = require_text("   ".to_owned(), FieldName::new("name")).expect_err("blank");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&err, "code"), "blank_field");
        assert_eq!(detail(&err, "field"), "name");
    }

    #[rstest]
    fn text_is_trimmed() {
        let value = require_text("  Prague ".to_owned(), FieldName::new("name")).expect("text");
        assert_eq!(value, "Prague");
    }

    #[rstest]
    fn invalid_uuid_reports_value() {
        let err = parse_uuid("nope", FieldName::new("cityId")).expect_err("invalid");
        assert_eq!(detail(&err, "value"), "nope");
        assert_eq!(detail(&err, "code"), "invalid_uuid");
    }

    #[rstest]
    #[case("2026-05-01T10:00:00Z", true)]
    #[case("2026-05-01T10:00:00+02:00", true)]
    #[case("2026-05-01", false)]
    fn timestamps_must_be_rfc3339(#[case] raw: &str, #[case] ok: bool) {
        let parsed = parse_rfc3339_timestamp(raw, FieldName::new("startDate"));
        assert_eq!(parsed.is_ok(), ok);
    }

    #[rstest]
    #[case(Some(14.4), Some(50.1), true)]
    #[case(None, None, true)]
    #[case(Some(14.4), None, false)]
    #[case(None, Some(50.1), false)]
    #[case(Some(181.0), Some(50.1), false)]
    fn coordinates_come_in_pairs(
        #[case] longitude: Option<f64>,
        #[case] latitude: Option<f64>,
        #[case] ok: bool,
    ) {
        assert_eq!(parse_optional_geo_point(longitude, latitude).is_ok(), ok);
    }

    #[rstest]
    fn out_of_range_latitude_names_the_field() {
        let err = parse_geo_point(0.0, 91.0).expect_err("latitude");
        assert_eq!(detail(&err, "field"), "latitude");
        assert_eq!(detail(&err, "code"), "invalid_coordinate");
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        image_url: Option<Option<String>>,
    }

    #[rstest]
    #[case(r#"{}"#, None)]
    #[case(r#"{"image_url":null}"#, Some(None))]
    #[case(r#"{"image_url":"x"}"#, Some(Some("x".to_owned())))]
    fn double_option_distinguishes_null(
        #[case] raw: &str,
        #[case] expected: Option<Option<String>>,
    ) {
        let patch: Patch = serde_json::from_str(raw).expect("patch");
        assert_eq!(patch.image_url, expected);
    }
}
