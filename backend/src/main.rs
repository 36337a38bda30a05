//! Backend entry-point: loads settings, applies migrations and serves the
//! REST API with its OpenAPI docs.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fleet_backend::inbound::http::health::HealthState;
use fleet_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use fleet_backend::settings::AppSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    let database_url = settings.database_url()?;

    let applied = run_pending_migrations(database_url)
        .await
        .wrap_err("failed to apply migrations")?;
    info!(applied, "database schema up to date");

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.db_pool_size()))
        .await
        .wrap_err("failed to build database pool")?;
    let config = ServerConfig::from_settings(&settings, pool)?;
    info!(bind_addr = %config.bind_addr(), "starting server");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("server terminated with an error")
}
