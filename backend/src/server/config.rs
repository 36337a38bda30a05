//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use fleet_backend::domain::{
    CityId, CityRegistryConfig, FanoutConfig, PlatformApplicationArn, TopicArn,
};
use fleet_backend::outbound::auth::JwtSettings;
use fleet_backend::outbound::persistence::DbPool;
use fleet_backend::settings::{AppSettings, SettingsError};
use url::Url;

/// Endpoints and credentials of the outbound adapters.
pub struct AdapterConfig {
    pub(crate) jwt: JwtSettings,
    pub(crate) push_relay_url: Url,
    pub(crate) push_relay_api_key: Option<String>,
    pub(crate) timezone_api_url: Url,
    pub(crate) timezone_api_key: Option<String>,
    pub(crate) http_timeout: Duration,
}

/// Tunables of the domain services.
pub struct ServiceConfig {
    pub(crate) fanout: FanoutConfig,
    pub(crate) cities: CityRegistryConfig,
    pub(crate) image_fallback_url: String,
}

/// Everything needed to build the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) adapters: AdapterConfig,
    pub(crate) services: ServiceConfig,
}

impl ServerConfig {
    /// Derive the server configuration from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a required value is missing or malformed.
    pub fn from_settings(settings: &AppSettings, db_pool: DbPool) -> Result<Self, SettingsError> {
        let adapters = AdapterConfig {
            jwt: JwtSettings {
                secret: settings.jwt_secret()?.to_owned(),
                issuer: settings.jwt_issuer.clone(),
                leeway_seconds: settings.jwt_leeway_seconds(),
            },
            push_relay_url: settings.push_relay_url()?,
            push_relay_api_key: settings.push_relay_api_key.clone(),
            timezone_api_url: settings.timezone_api_url()?,
            timezone_api_key: settings.timezone_api_key.clone(),
            http_timeout: settings.http_timeout(),
        };
        let services = ServiceConfig {
            fanout: FanoutConfig {
                topic_arn: TopicArn::new(settings.push_topic_arn()?),
                concurrency_limit: settings.fanout_concurrency(),
                android_application_arn: PlatformApplicationArn::new(
                    settings.push_android_app_arn()?,
                ),
                ios_application_arn: PlatformApplicationArn::new(settings.push_ios_app_arn()?),
            },
            cities: CityRegistryConfig {
                default_radius_m: settings.default_city_radius_m(),
                test_city_id: CityId::from(settings.test_city_id()?),
            },
            image_fallback_url: settings.event_image_fallback_url().to_owned(),
        };
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            db_pool,
            adapters,
            services,
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
