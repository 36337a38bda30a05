//! Translation of driven-port failures into domain errors.
//!
//! Several services share the same repositories; keeping the mapping in one
//! place keeps status codes consistent across them.

use super::Error;
use super::ports::{
    CityRepositoryError, CitySubscriptionRepositoryError, EventRegistrationRepositoryError,
    EventRepositoryError, EventVisibilityRepositoryError, MessageInteractionRepositoryError,
    PushTokenRepositoryError, UserDirectoryError,
};

pub(crate) fn map_user_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

pub(crate) fn map_city_error(error: CityRepositoryError) -> Error {
    match error {
        CityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("city repository unavailable: {message}"))
        }
        CityRepositoryError::Query { message } => {
            Error::internal(format!("city repository error: {message}"))
        }
        CityRepositoryError::Duplicate { message } => {
            Error::conflict(format!("city already exists: {message}"))
        }
    }
}

pub(crate) fn map_subscription_error(error: CitySubscriptionRepositoryError) -> Error {
    match error {
        CitySubscriptionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("subscription repository unavailable: {message}"))
        }
        CitySubscriptionRepositoryError::Query { message } => {
            Error::internal(format!("subscription repository error: {message}"))
        }
        CitySubscriptionRepositoryError::Duplicate { .. } => {
            Error::conflict("user is already subscribed to this city")
        }
    }
}

pub(crate) fn map_event_error(error: EventRepositoryError) -> Error {
    match error {
        EventRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("event repository unavailable: {message}"))
        }
        EventRepositoryError::Query { message } => {
            Error::internal(format!("event repository error: {message}"))
        }
        EventRepositoryError::Duplicate { .. } => Error::conflict(
            "an event with the same name, dates and city already exists",
        ),
        EventRepositoryError::Transaction { message } => {
            Error::internal(format!("event removal failed: {message}"))
        }
    }
}

pub(crate) fn map_visibility_error(error: EventVisibilityRepositoryError) -> Error {
    match error {
        EventVisibilityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("event visibility unavailable: {message}"))
        }
        EventVisibilityRepositoryError::Query { message } => {
            Error::internal(format!("event visibility error: {message}"))
        }
    }
}

pub(crate) fn map_registration_error(error: EventRegistrationRepositoryError) -> Error {
    match error {
        EventRegistrationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("registration repository unavailable: {message}"))
        }
        EventRegistrationRepositoryError::Query { message } => {
            Error::internal(format!("registration repository error: {message}"))
        }
        EventRegistrationRepositoryError::Duplicate { .. } => {
            Error::conflict("registration already exists")
        }
    }
}

pub(crate) fn map_interaction_error(error: MessageInteractionRepositoryError) -> Error {
    match error {
        MessageInteractionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("interaction repository unavailable: {message}"))
        }
        MessageInteractionRepositoryError::Query { message } => {
            Error::internal(format!("interaction repository error: {message}"))
        }
        MessageInteractionRepositoryError::Duplicate { .. } => {
            Error::conflict("message interaction already exists")
        }
    }
}

pub(crate) fn map_push_token_error(error: PushTokenRepositoryError) -> Error {
    match error {
        PushTokenRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("push token repository unavailable: {message}"))
        }
        PushTokenRepositoryError::Query { message } => {
            Error::internal(format!("push token repository error: {message}"))
        }
        PushTokenRepositoryError::Duplicate { .. } => {
            Error::conflict("push token already registered")
        }
    }
}
