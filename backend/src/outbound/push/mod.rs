//! Push provider adapters.
//!
//! The provider is reached through a JSON relay that exposes the
//! topic/endpoint operations of the mobile push service one action per path.

mod dto;
mod http_gateway;

pub use http_gateway::{HttpPushGateway, PushRelayIdentity};
