//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **push**: mobile push provider reached through an HTTP relay
//! - **geocoding**: reverse timezone lookup for new cities
//! - **auth**: bearer access token verification
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod auth;
pub mod geocoding;
pub mod persistence;
pub mod push;
