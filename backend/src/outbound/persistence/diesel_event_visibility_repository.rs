//! PostgreSQL-backed `EventVisibilityRepository`.
//!
//! Both reads share one set-based statement: an event is visible when it
//! ends after the cutoff and is global, answered by the user, or in a city
//! the user is actively subscribed to. The caller's answer and read state
//! come from left joins, so no per-event lookups follow.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::sql_query;
use diesel::sql_types::{Nullable, Timestamptz, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{EventVisibilityRepository, EventVisibilityRepositoryError};
use crate::domain::{EventId, UserEvent, UserId};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{EVENT_WITH_CITY_COLUMNS, UserEventRow};
use super::pool::{DbPool, PoolError};

/// Diesel-backed implementation of the visibility read model.
#[derive(Clone)]
pub struct DieselEventVisibilityRepository {
    pool: DbPool,
}

impl DieselEventVisibilityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        user_id: &UserId,
        event_id: Option<Uuid>,
        ends_after: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>, EventVisibilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserEventRow> = sql_query(VISIBLE_EVENTS_SQL.as_str())
            .bind::<SqlUuid, _>(user_id.as_uuid())
            .bind::<Timestamptz, _>(ends_after)
            .bind::<Nullable<SqlUuid>, _>(event_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| UserEvent::try_from(row).map_err(EventVisibilityRepositoryError::query))
            .collect()
    }
}

static VISIBLE_EVENTS_SQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
SELECT {EVENT_WITH_CITY_COLUMNS},
    r.going AS going,
    m.state AS message_state
FROM events e
LEFT JOIN cities c ON c.id = e.city_id
LEFT JOIN event_registrations r ON r.event_id = e.id AND r.user_id = $1
LEFT JOIN message_interactions m ON m.event_id = e.id AND m.user_id = $1
WHERE e.end_date > $2
  AND ($3::uuid IS NULL OR e.id = $3)
  AND (
    e.city_id IS NULL
    OR r.user_id IS NOT NULL
    OR EXISTS (
        SELECT 1 FROM city_subscriptions s
        WHERE s.user_id = $1 AND s.city_id = e.city_id AND s.deleted_at IS NULL
    )
  )
ORDER BY e.published_at DESC, e.id
"#
    )
});

fn map_pool_error(error: PoolError) -> EventVisibilityRepositoryError {
    map_basic_pool_error(error, EventVisibilityRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EventVisibilityRepositoryError {
    map_basic_diesel_error(
        error,
        EventVisibilityRepositoryError::query,
        EventVisibilityRepositoryError::connection,
    )
}

#[async_trait]
impl EventVisibilityRepository for DieselEventVisibilityRepository {
    async fn visible_events(
        &self,
        user_id: &UserId,
        ends_after: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>, EventVisibilityRepositoryError> {
        self.load(user_id, None, ends_after).await
    }

    async fn visible_event(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        ends_after: DateTime<Utc>,
    ) -> Result<Option<UserEvent>, EventVisibilityRepositoryError> {
        let rows = self.load(user_id, Some(*event_id.as_uuid()), ends_after).await?;
        Ok(rows.into_iter().next())
    }
}
