//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod admin_cities;
pub mod admin_events;
pub mod auth;
pub mod cities;
pub mod error;
pub mod event_dto;
pub mod events;
pub mod health;
pub mod inbox;
pub mod push_tokens;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// Literal segments are registered ahead of `{id}` captures that share a
/// prefix, so `/admin/cities/summary` never reaches the single-city handler.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(cities::list_cities)
        .service(cities::city_at_location)
        .service(cities::list_subscriptions)
        .service(cities::subscribe)
        .service(cities::unsubscribe)
        .service(events::list_events)
        .service(events::register)
        .service(events::get_event)
        .service(inbox::get_inbox)
        .service(inbox::interact_with_message)
        .service(push_tokens::register_token)
        .service(push_tokens::remove_token)
        .service(admin_cities::list_cities)
        .service(admin_cities::city_summary)
        .service(admin_cities::create_city)
        .service(admin_cities::get_city)
        .service(admin_cities::update_city)
        .service(admin_cities::delete_city)
        .service(admin_events::list_events)
        .service(admin_events::create_event)
        .service(admin_events::get_event)
        .service(admin_events::update_event)
        .service(admin_events::delete_event);
}
