//! Application settings loaded via OrthoConfig.
//!
//! Values come from `FLEET_*` environment variables, CLI flags or a config
//! file. Optional values fall back to the defaults below; the database URL,
//! JWT secret and push provider identifiers are required.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::domain::DEFAULT_CONCURRENCY_LIMIT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_POOL_SIZE: u32 = 10;
const DEFAULT_JWT_LEEWAY_SECONDS: u64 = 30;
const DEFAULT_TIMEZONE_API_URL: &str = "https://maps.googleapis.com/maps/api/timezone/json";
const DEFAULT_CITY_RADIUS_M: u32 = 15_000;
const DEFAULT_TEST_CITY_ID: Uuid = Uuid::from_u128(1);
const DEFAULT_EVENT_IMAGE_URL: &str = "https://cdn.fleet.example/events/default.png";
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// A setting that is absent or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required key has no value.
    #[error("missing required setting {key}")]
    Missing { key: &'static str },
    /// A value failed to parse.
    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl SettingsError {
    fn invalid(key: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Invalid {
            key,
            message: err.to_string(),
        }
    }
}

fn required<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str, SettingsError> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or(SettingsError::Missing { key })
}

fn parse_url(raw: &str, key: &'static str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::invalid(key, err))
}

/// Process-wide configuration for the fleet backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FLEET")]
pub struct AppSettings {
    /// Socket the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// HMAC secret shared with the identity service.
    pub jwt_secret: Option<String>,
    /// Expected `iss` claim.
    pub jwt_issuer: Option<String>,
    /// Tolerated clock skew on token expiry.
    pub jwt_leeway_seconds: Option<u64>,
    /// Base URL of the push relay.
    pub push_relay_url: Option<String>,
    /// Bearer key the relay expects.
    pub push_relay_api_key: Option<String>,
    /// Broadcast topic every device endpoint subscribes to.
    pub push_topic_arn: Option<String>,
    /// Platform application for Android tokens.
    pub push_android_app_arn: Option<String>,
    /// Platform application for iOS tokens.
    pub push_ios_app_arn: Option<String>,
    /// Upper bound on concurrent per-endpoint publishes.
    pub fanout_concurrency: Option<usize>,
    /// Reverse timezone lookup endpoint.
    pub timezone_api_url: Option<String>,
    /// Key for the timezone endpoint.
    pub timezone_api_key: Option<String>,
    /// Radius given to cities registered without one.
    pub default_city_radius_m: Option<u32>,
    /// Identifier of the protected test city.
    pub test_city_id: Option<String>,
    /// Image shown when neither an event nor its city has one.
    pub event_image_fallback_url: Option<String>,
    /// Timeout for outbound HTTP calls.
    pub http_timeout_seconds: Option<u64>,
}

impl AppSettings {
    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for an unparsable address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|err| SettingsError::invalid("bind_addr", err))
    }

    /// Database connection string.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        required(self.database_url.as_deref(), "database_url")
    }

    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE)
    }

    /// HMAC secret for access tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn jwt_secret(&self) -> Result<&str, SettingsError> {
        required(self.jwt_secret.as_deref(), "jwt_secret")
    }

    pub fn jwt_leeway_seconds(&self) -> u64 {
        self.jwt_leeway_seconds
            .unwrap_or(DEFAULT_JWT_LEEWAY_SECONDS)
    }

    /// Push relay base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when unset or malformed.
    pub fn push_relay_url(&self) -> Result<Url, SettingsError> {
        let raw = required(self.push_relay_url.as_deref(), "push_relay_url")?;
        parse_url(raw, "push_relay_url")
    }

    /// Broadcast topic identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn push_topic_arn(&self) -> Result<&str, SettingsError> {
        required(self.push_topic_arn.as_deref(), "push_topic_arn")
    }

    /// Android platform application identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn push_android_app_arn(&self) -> Result<&str, SettingsError> {
        required(self.push_android_app_arn.as_deref(), "push_android_app_arn")
    }

    /// iOS platform application identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn push_ios_app_arn(&self) -> Result<&str, SettingsError> {
        required(self.push_ios_app_arn.as_deref(), "push_ios_app_arn")
    }

    /// Fan-out concurrency, never below one.
    pub fn fanout_concurrency(&self) -> usize {
        self.fanout_concurrency
            .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
            .max(1)
    }

    /// Timezone lookup endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for a malformed URL.
    pub fn timezone_api_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            self.timezone_api_url
                .as_deref()
                .unwrap_or(DEFAULT_TIMEZONE_API_URL),
            "timezone_api_url",
        )
    }

    pub fn default_city_radius_m(&self) -> u32 {
        self.default_city_radius_m
            .unwrap_or(DEFAULT_CITY_RADIUS_M)
    }

    /// Protected test city identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for a malformed UUID.
    pub fn test_city_id(&self) -> Result<Uuid, SettingsError> {
        self.test_city_id
            .as_deref()
            .map_or(Ok(DEFAULT_TEST_CITY_ID), |raw| {
                Uuid::parse_str(raw).map_err(|err| SettingsError::invalid("test_city_id", err))
            })
    }

    pub fn event_image_fallback_url(&self) -> &str {
        self.event_image_fallback_url
            .as_deref()
            .unwrap_or(DEFAULT_EVENT_IMAGE_URL)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http_timeout_seconds
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Configuration parsing from the environment.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("fleet-backend")]).expect("config should load")
    }

    /// Every variable the tests touch, in a fixed order.
    fn env(
        database_url: Option<&str>,
        relay_url: Option<&str>,
        concurrency: Option<&str>,
        radius: Option<&str>,
        test_city_id: Option<&str>,
    ) -> [(&'static str, Option<String>); 7] {
        let owned = |value: Option<&str>| value.map(str::to_owned);
        [
            ("FLEET_BIND_ADDR", None),
            ("FLEET_JWT_SECRET", None),
            ("FLEET_DATABASE_URL", owned(database_url)),
            ("FLEET_PUSH_RELAY_URL", owned(relay_url)),
            ("FLEET_FANOUT_CONCURRENCY", owned(concurrency)),
            ("FLEET_DEFAULT_CITY_RADIUS_M", owned(radius)),
            ("FLEET_TEST_CITY_ID", owned(test_city_id)),
        ]
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env(None, None, None, None, None));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.fanout_concurrency(), DEFAULT_CONCURRENCY_LIMIT);
        assert_eq!(settings.default_city_radius_m(), DEFAULT_CITY_RADIUS_M);
        assert_eq!(
            settings.test_city_id().expect("test city"),
            DEFAULT_TEST_CITY_ID
        );
        assert_eq!(
            settings.database_url(),
            Err(SettingsError::Missing {
                key: "database_url"
            })
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env(
            Some("postgres://fleet@db/fleet"),
            Some("https://relay.fleet.test/"),
            Some("0"),
            Some("20000"),
            None,
        ));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.database_url().expect("database url"),
            "postgres://fleet@db/fleet"
        );
        assert_eq!(
            settings.push_relay_url().expect("relay").as_str(),
            "https://relay.fleet.test/"
        );
        assert_eq!(settings.fanout_concurrency(), 1);
        assert_eq!(settings.default_city_radius_m(), 20_000);
    }

    #[rstest]
    fn malformed_test_city_id_is_reported() {
        let _guard = lock_env(env(None, None, None, None, Some("not-a-uuid")));

        let settings = load_from_empty_args();
        assert!(matches!(
            settings.test_city_id(),
            Err(SettingsError::Invalid {
                key: "test_city_id",
                ..
            })
        ));
    }
}
