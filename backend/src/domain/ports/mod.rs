//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`) are implemented by domain services
//! and called by inbound adapters. Driven ports (`*Repository`, gateways,
//! lookups) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod access_token_verifier;
mod board_firmware_query;
mod city_command;
mod city_query;
mod city_repository;
mod city_subscription_repository;
mod event_command;
mod event_notifier;
mod event_query;
mod event_registration_repository;
mod event_repository;
mod event_visibility_query;
mod event_visibility_repository;
mod inbox_query;
mod message_interaction_command;
mod message_interaction_repository;
mod push_gateway;
mod push_token_command;
mod push_token_repository;
mod registration_command;
mod subscription_command;
mod subscription_query;
mod timezone_lookup;
mod user_directory;

#[cfg(test)]
pub use access_token_verifier::MockAccessTokenVerifier;
pub use access_token_verifier::{AccessTokenError, AccessTokenVerifier};
#[cfg(test)]
pub use board_firmware_query::MockBoardFirmwareQuery;
pub use board_firmware_query::{
    BoardFirmwareQuery, BoardFirmwareQueryError, FixtureBoardFirmwareQuery,
};
pub use city_command::CityCommand;
#[cfg(test)]
pub use city_command::MockCityCommand;
pub use city_query::CityQuery;
#[cfg(test)]
pub use city_query::MockCityQuery;
#[cfg(test)]
pub use city_repository::MockCityRepository;
pub use city_repository::{CityRepository, CityRepositoryError};
#[cfg(test)]
pub use city_subscription_repository::MockCitySubscriptionRepository;
pub use city_subscription_repository::{
    CitySubscriptionRepository, CitySubscriptionRepositoryError,
};
pub use event_command::EventCommand;
#[cfg(test)]
pub use event_command::MockEventCommand;
#[cfg(test)]
pub use event_notifier::MockEventNotifier;
pub use event_notifier::EventNotifier;
pub use event_query::EventQuery;
#[cfg(test)]
pub use event_query::MockEventQuery;
#[cfg(test)]
pub use event_registration_repository::MockEventRegistrationRepository;
pub use event_registration_repository::{
    EventRegistrationRepository, EventRegistrationRepositoryError,
};
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use event_repository::{EventRepository, EventRepositoryError};
pub use event_visibility_query::EventVisibilityQuery;
#[cfg(test)]
pub use event_visibility_query::MockEventVisibilityQuery;
#[cfg(test)]
pub use event_visibility_repository::MockEventVisibilityRepository;
pub use event_visibility_repository::{
    EventVisibilityRepository, EventVisibilityRepositoryError,
};
pub use inbox_query::InboxQuery;
#[cfg(test)]
pub use inbox_query::MockInboxQuery;
pub use message_interaction_command::MessageInteractionCommand;
#[cfg(test)]
pub use message_interaction_command::MockMessageInteractionCommand;
#[cfg(test)]
pub use message_interaction_repository::MockMessageInteractionRepository;
pub use message_interaction_repository::{
    MessageInteractionRepository, MessageInteractionRepositoryError,
};
#[cfg(test)]
pub use push_gateway::MockPushGateway;
pub use push_gateway::{PushGateway, PushGatewayError};
#[cfg(test)]
pub use push_token_command::MockPushTokenCommand;
pub use push_token_command::{PushTokenCommand, PushTokenRegistration};
#[cfg(test)]
pub use push_token_repository::MockPushTokenRepository;
pub use push_token_repository::{PushTokenRepository, PushTokenRepositoryError};
#[cfg(test)]
pub use registration_command::MockRegistrationCommand;
pub use registration_command::RegistrationCommand;
#[cfg(test)]
pub use subscription_command::MockSubscriptionCommand;
pub use subscription_command::SubscriptionCommand;
#[cfg(test)]
pub use subscription_query::MockSubscriptionQuery;
pub use subscription_query::SubscriptionQuery;
#[cfg(test)]
pub use timezone_lookup::MockTimezoneLookup;
pub use timezone_lookup::{FixtureTimezoneLookup, TimezoneLookup, TimezoneLookupError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{UserDirectory, UserDirectoryError};
