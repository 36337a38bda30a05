//! Port for reverse timezone lookup.

use async_trait::async_trait;

use crate::domain::GeoPoint;

use super::define_port_error;

define_port_error! {
    /// Errors raised by timezone lookup adapters.
    pub enum TimezoneLookupError {
        /// The service could not be reached.
        Transport { message: String } =>
            "timezone lookup transport failed: {message}",
        /// The service answered with something unusable.
        Decode { message: String } =>
            "timezone lookup response invalid: {message}",
        /// No timezone covers the coordinate.
        NotFound { message: String } =>
            "no timezone for coordinate: {message}",
    }
}

/// Resolve an IANA timezone for a coordinate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimezoneLookup: Send + Sync {
    /// IANA zone name such as `Europe/Prague`.
    async fn timezone_for(&self, point: &GeoPoint) -> Result<String, TimezoneLookupError>;
}

/// Fixture lookup answering `UTC` for every coordinate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTimezoneLookup;

#[async_trait]
impl TimezoneLookup for FixtureTimezoneLookup {
    async fn timezone_for(&self, _point: &GeoPoint) -> Result<String, TimezoneLookupError> {
        Ok("UTC".to_owned())
    }
}
