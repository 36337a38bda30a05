//! Event visibility resolver.
//!
//! Builds a user's inbox view of events. Visibility itself is computed by
//! the read model in one set-based query; this service fixes the cutoff,
//! resolves images, and flips new messages to seen on request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;

use super::message_interaction_service::record_interaction;
use super::service_errors::map_visibility_error;
use crate::domain::ports::{
    EventVisibilityQuery, EventVisibilityRepository, MessageInteractionRepository,
};
use crate::domain::{
    Error, EventId, MessageState, MessageTarget, StoredMessageState, UserEvent, UserId,
};

/// Days after its end that an event stays in the inbox.
const VISIBILITY_GRACE_DAYS: i64 = 1;

/// Earliest end date an event may have and still be shown at `now`.
pub(crate) fn visibility_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(VISIBILITY_GRACE_DAYS)
}

/// Options the resolver reads at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventVisibilityConfig {
    /// Image used when neither the event nor its city has one.
    pub image_fallback_url: String,
}

/// Service implementing [`EventVisibilityQuery`].
#[derive(Clone)]
pub struct EventVisibilityService<V, I> {
    visibility: Arc<V>,
    interactions: Arc<I>,
    clock: Arc<dyn Clock>,
    config: EventVisibilityConfig,
}

impl<V, I> EventVisibilityService<V, I> {
    /// Create the service.
    pub fn new(
        visibility: Arc<V>,
        interactions: Arc<I>,
        clock: Arc<dyn Clock>,
        config: EventVisibilityConfig,
    ) -> Self {
        Self {
            visibility,
            interactions,
            clock,
            config,
        }
    }

    fn cutoff(&self) -> DateTime<Utc> {
        visibility_cutoff(self.clock.utc())
    }

    fn with_fallback_image(&self, mut event: UserEvent) -> UserEvent {
        if event.image_url.is_none() {
            event.image_url = Some(self.config.image_fallback_url.clone());
        }
        event
    }
}

#[async_trait]
impl<V, I> EventVisibilityQuery for EventVisibilityService<V, I>
where
    V: EventVisibilityRepository,
    I: MessageInteractionRepository,
{
    async fn upcoming_events_with_going_status(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserEvent>, Error> {
        let events = self
            .visibility
            .visible_events(user_id, self.cutoff())
            .await
            .map_err(map_visibility_error)?;
        Ok(events
            .into_iter()
            .map(|event| self.with_fallback_image(event))
            .collect())
    }

    async fn single_event_for_user(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        change_to_read: bool,
    ) -> Result<UserEvent, Error> {
        let mut event = self
            .visibility
            .visible_event(user_id, event_id, self.cutoff())
            .await
            .map_err(map_visibility_error)?
            .ok_or_else(|| {
                Error::not_found(format!("event {event_id} not found within the user's events"))
            })?;

        if change_to_read && event.message_state == MessageState::New {
            let target = MessageTarget::Event {
                event_id: *event_id,
            };
            record_interaction(
                self.interactions.as_ref(),
                user_id,
                &target,
                StoredMessageState::Seen,
            )
            .await?;
            event.message_state = MessageState::Seen;
        }
        Ok(self.with_fallback_image(event))
    }
}
