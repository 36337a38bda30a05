//! Message interaction service.
//!
//! Stores the per-user read state of inbox messages. Only `seen` and
//! `deleted` are persisted; repeating the current state changes nothing and
//! the two stored states may replace each other freely.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::service_errors::{map_interaction_error, map_user_directory_error};
use crate::domain::ports::{
    EventVisibilityQuery, MessageInteractionCommand, MessageInteractionRepository,
    MessageInteractionRepositoryError, UserDirectory,
};
use crate::domain::{Error, MessageTarget, StoredMessageState, UserId};

/// Write `state` for the pair unless it is already stored.
///
/// A racing first write that loses the unique constraint falls through to
/// an in-place update.
pub(crate) async fn record_interaction<R>(
    repo: &R,
    user_id: &UserId,
    target: &MessageTarget,
    state: StoredMessageState,
) -> Result<(), Error>
where
    R: MessageInteractionRepository + ?Sized,
{
    let current = repo
        .find(user_id, target)
        .await
        .map_err(map_interaction_error)?;
    match current {
        Some(stored) if stored == state => {
            debug!(user_id = %user_id, state = state.as_str(), "message state unchanged");
            return Ok(());
        }
        Some(_) => {}
        None => match repo.insert(user_id, target, state).await {
            Ok(()) => return Ok(()),
            Err(MessageInteractionRepositoryError::Duplicate { .. }) => {}
            Err(err) => return Err(map_interaction_error(err)),
        },
    }

    let changed = repo
        .update(user_id, target, state)
        .await
        .map_err(map_interaction_error)?;
    if changed == 0 {
        return Err(Error::not_found("message interaction not found"));
    }
    Ok(())
}

/// Service implementing [`MessageInteractionCommand`].
#[derive(Clone)]
pub struct MessageInteractionService<U, Q, I> {
    users: Arc<U>,
    visibility: Arc<Q>,
    interactions: Arc<I>,
}

impl<U, Q, I> MessageInteractionService<U, Q, I> {
    /// Create the service.
    pub fn new(users: Arc<U>, visibility: Arc<Q>, interactions: Arc<I>) -> Self {
        Self {
            users,
            visibility,
            interactions,
        }
    }
}

#[async_trait]
impl<U, Q, I> MessageInteractionCommand for MessageInteractionService<U, Q, I>
where
    U: UserDirectory,
    Q: EventVisibilityQuery,
    I: MessageInteractionRepository,
{
    async fn interact_with_message(
        &self,
        user_id: &UserId,
        target: MessageTarget,
        state: StoredMessageState,
    ) -> Result<(), Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_directory_error)?;
        if user.is_none() {
            return Err(Error::not_found(format!("user {user_id} not found")));
        }
        match target {
            MessageTarget::Event { event_id } => {
                self.visibility
                    .single_event_for_user(user_id, &event_id, false)
                    .await?;
            }
        }
        record_interaction(self.interactions.as_ref(), user_id, &target, state).await
    }
}
