//! Reqwest-backed timezone lookup.
//!
//! Queries a Google-style time zone endpoint with the raw coordinate and
//! returns the reported IANA zone id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::domain::GeoPoint;
use crate::domain::ports::{TimezoneLookup, TimezoneLookupError};

const ZERO_RESULTS: &str = "ZERO_RESULTS";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimezoneResponseDto {
    status: String,
    #[serde(default)]
    time_zone_id: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Timezone lookup that performs one GET per coordinate.
pub struct HttpTimezoneLookup {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpTimezoneLookup {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn request_url(&self, point: &GeoPoint, timestamp: i64) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(
                    "location",
                    &format!("{},{}", point.latitude(), point.longitude()),
                )
                .append_pair("timestamp", &timestamp.to_string());
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        url
    }
}

#[async_trait]
impl TimezoneLookup for HttpTimezoneLookup {
    async fn timezone_for(&self, point: &GeoPoint) -> Result<String, TimezoneLookupError> {
        let url = self.request_url(point, chrono::Utc::now().timestamp());
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| TimezoneLookupError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| TimezoneLookupError::transport(err.to_string()))?;
        if status == StatusCode::NOT_FOUND {
            return Err(TimezoneLookupError::not_found(describe(point)));
        }
        if !status.is_success() {
            return Err(TimezoneLookupError::transport(format!(
                "status {}",
                status.as_u16()
            )));
        }
        parse_timezone(body.as_ref(), point)
    }
}

fn describe(point: &GeoPoint) -> String {
    format!("({}, {})", point.longitude(), point.latitude())
}

fn parse_timezone(body: &[u8], point: &GeoPoint) -> Result<String, TimezoneLookupError> {
    let decoded: TimezoneResponseDto = serde_json::from_slice(body).map_err(|error| {
        TimezoneLookupError::decode(format!("invalid timezone JSON payload: {error}"))
    })?;
    match (decoded.status.as_str(), decoded.time_zone_id) {
        ("OK", Some(zone)) if !zone.trim().is_empty() => Ok(zone),
        ("OK", _) => Err(TimezoneLookupError::decode("response without timeZoneId")),
        (ZERO_RESULTS, _) => Err(TimezoneLookupError::not_found(describe(point))),
        (status, _) => Err(TimezoneLookupError::transport(format!(
            "status {status}: {}",
            decoded.error_message.unwrap_or_default()
        ))),
    }
}
