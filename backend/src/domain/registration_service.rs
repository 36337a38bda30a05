//! Event registration ledger.
//!
//! A first answer to a city event needs an active subscription to that
//! city. Later answers update the stored row and skip the check, which is
//! what keeps attended events visible after the user unsubscribes.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::service_errors::{
    map_event_error, map_registration_error, map_subscription_error, map_user_directory_error,
};
use super::visibility_service::visibility_cutoff;
use crate::domain::ports::{
    CitySubscriptionRepository, EventRegistrationRepository, EventRegistrationRepositoryError,
    EventRepository, EventVisibilityQuery, RegistrationCommand, UserDirectory,
};
use crate::domain::{Error, Event, EventId, EventRegistration, UserEvent, UserId};

/// Service implementing [`RegistrationCommand`].
#[derive(Clone)]
pub struct EventRegistrationService<U, E, S, R, Q> {
    users: Arc<U>,
    events: Arc<E>,
    subscriptions: Arc<S>,
    registrations: Arc<R>,
    visibility: Arc<Q>,
    clock: Arc<dyn Clock>,
}

impl<U, E, S, R, Q> EventRegistrationService<U, E, S, R, Q> {
    /// Create the service.
    pub fn new(
        users: Arc<U>,
        events: Arc<E>,
        subscriptions: Arc<S>,
        registrations: Arc<R>,
        visibility: Arc<Q>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            events,
            subscriptions,
            registrations,
            visibility,
            clock,
        }
    }
}

impl<U, E, S, R, Q> EventRegistrationService<U, E, S, R, Q>
where
    U: UserDirectory,
    E: EventRepository,
    S: CitySubscriptionRepository,
    R: EventRegistrationRepository,
    Q: EventVisibilityQuery,
{
    async fn user_and_event(&self, user_id: &UserId, event_id: &EventId) -> Result<Event, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_directory_error)?;
        let event = self
            .events
            .find_by_id(event_id)
            .await
            .map_err(map_event_error)?;
        match (user, event) {
            (Some(_), Some(event)) => Ok(event),
            (None, Some(_)) => Err(Error::not_found(format!("user {user_id} not found"))),
            (Some(_), None) => Err(Error::not_found(format!("event {event_id} not found"))),
            (None, None) => Err(Error::not_found(format!(
                "user {user_id} and event {event_id} not found"
            ))),
        }
    }

    async fn update_answer(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        going: bool,
    ) -> Result<(), Error> {
        let updated = self
            .registrations
            .update_going(user_id, event_id, going)
            .await
            .map_err(map_registration_error)?;
        if !updated {
            return Err(Error::not_found(format!(
                "registration for event {event_id} not found"
            )));
        }
        Ok(())
    }

    async fn first_answer(
        &self,
        user_id: &UserId,
        event: &Event,
        going: bool,
    ) -> Result<(), Error> {
        if let Some(city_id) = event.city_id {
            let subscribed = self
                .subscriptions
                .find_active(user_id, &city_id)
                .await
                .map_err(map_subscription_error)?
                .is_some();
            if !subscribed {
                return Err(Error::not_found(format!(
                    "event {} not found within the subscribed cities",
                    event.id
                )));
            }
        }
        let now = self.clock.utc();
        let registration = EventRegistration {
            user_id: user_id.clone(),
            event_id: event.id,
            going,
            created_at: now,
            updated_at: now,
        };
        match self.registrations.insert(&registration).await {
            Ok(()) => Ok(()),
            Err(EventRegistrationRepositoryError::Duplicate { .. }) => {
                self.update_answer(user_id, &event.id, going).await
            }
            Err(err) => Err(map_registration_error(err)),
        }
    }
}

#[async_trait]
impl<U, E, S, R, Q> RegistrationCommand for EventRegistrationService<U, E, S, R, Q>
where
    U: UserDirectory,
    E: EventRepository,
    S: CitySubscriptionRepository,
    R: EventRegistrationRepository,
    Q: EventVisibilityQuery,
{
    async fn register(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        going: bool,
    ) -> Result<UserEvent, Error> {
        let event = self.user_and_event(user_id, event_id).await?;
        if event.end_date <= visibility_cutoff(self.clock.utc()) {
            return Err(Error::not_found(format!("event {event_id} has already ended")));
        }
        let existing = self
            .registrations
            .find(user_id, event_id)
            .await
            .map_err(map_registration_error)?;
        if existing.is_some() {
            self.update_answer(user_id, event_id, going).await?;
        } else {
            self.first_answer(user_id, &event, going).await?;
        }
        info!(user_id = %user_id, event_id = %event_id, going, "event answer recorded");
        self.visibility
            .single_event_for_user(user_id, event_id, false)
            .await
    }
}
