//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations translate between Diesel rows and domain
//! types. Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! private to this module, and every database failure is mapped onto the
//! owning port's error type.
//!
//! ```no_run
//! use fleet_backend::outbound::persistence::{DbPool, DieselCityRepository, PoolConfig};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/fleet")).await?;
//! let cities = DieselCityRepository::new(pool);
//! # let _ = cities;
//! # Ok(())
//! # }
//! ```

mod diesel_board_firmware_query;
mod diesel_city_repository;
mod diesel_city_subscription_repository;
mod diesel_error_mapping;
mod diesel_event_registration_repository;
mod diesel_event_repository;
mod diesel_event_visibility_repository;
mod diesel_message_interaction_repository;
mod diesel_push_token_repository;
mod diesel_user_directory;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_board_firmware_query::DieselBoardFirmwareQuery;
pub use diesel_city_repository::DieselCityRepository;
pub use diesel_city_subscription_repository::DieselCitySubscriptionRepository;
pub use diesel_event_registration_repository::DieselEventRegistrationRepository;
pub use diesel_event_repository::DieselEventRepository;
pub use diesel_event_visibility_repository::DieselEventVisibilityRepository;
pub use diesel_message_interaction_repository::DieselMessageInteractionRepository;
pub use diesel_push_token_repository::DieselPushTokenRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
