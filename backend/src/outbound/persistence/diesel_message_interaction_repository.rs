//! PostgreSQL-backed `MessageInteractionRepository`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{MessageInteractionRepository, MessageInteractionRepositoryError};
use crate::domain::{MessageTarget, StoredMessageState, UserId};

use super::diesel_error_mapping::{map_basic_pool_error, map_unique_diesel_error};
use super::models::NewMessageInteractionRow;
use super::pool::{DbPool, PoolError};
use super::schema::message_interactions;

/// Diesel-backed implementation of the interaction repository port.
#[derive(Clone)]
pub struct DieselMessageInteractionRepository {
    pool: DbPool,
}

impl DieselMessageInteractionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MessageInteractionRepositoryError {
    map_basic_pool_error(error, MessageInteractionRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MessageInteractionRepositoryError {
    map_unique_diesel_error(
        error,
        MessageInteractionRepositoryError::query,
        MessageInteractionRepositoryError::connection,
        MessageInteractionRepositoryError::duplicate,
    )
}

/// Key columns for a message target.
fn target_event_id(target: &MessageTarget) -> Uuid {
    match target {
        MessageTarget::Event { event_id } => *event_id.as_uuid(),
    }
}

#[async_trait]
impl MessageInteractionRepository for DieselMessageInteractionRepository {
    async fn find(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
    ) -> Result<Option<StoredMessageState>, MessageInteractionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let state: Option<String> = message_interactions::table
            .find((user_id.as_uuid(), target_event_id(target)))
            .select(message_interactions::state)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        state
            .map(|value| {
                StoredMessageState::from_column(&value).ok_or_else(|| {
                    MessageInteractionRepositoryError::query(format!(
                        "unknown message state `{value}`"
                    ))
                })
            })
            .transpose()
    }

    async fn insert(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
        state: StoredMessageState,
    ) -> Result<(), MessageInteractionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(message_interactions::table)
            .values(NewMessageInteractionRow {
                user_id: *user_id.as_uuid(),
                event_id: target_event_id(target),
                state: state.as_str(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        user_id: &UserId,
        target: &MessageTarget,
        state: StoredMessageState,
    ) -> Result<u64, MessageInteractionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            message_interactions::table.find((user_id.as_uuid(), target_event_id(target))),
        )
        .set((
            message_interactions::state.eq(state.as_str()),
            message_interactions::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated as u64)
    }
}
