//! PostgreSQL-backed `EventRepository`.
//!
//! Admin listings compute attendance and subscriber aggregates with
//! correlated subqueries so a listing is a single round trip.

use std::sync::LazyLock;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Nullable, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{EventRepository, EventRepositoryError};
use crate::domain::{AdminEvent, CityId, Event, EventId, EventKey};

use super::diesel_error_mapping::{
    map_basic_pool_error, map_transaction_diesel_error, map_unique_diesel_error,
};
use super::models::{AdminEventRow, EVENT_WITH_CITY_COLUMNS, EventRecord, EventRow};
use super::pool::{DbPool, PoolError};
use super::schema::{event_registrations, events, message_interactions};

/// Diesel-backed implementation of the event repository port.
#[derive(Clone)]
pub struct DieselEventRepository {
    pool: DbPool,
}

impl DieselEventRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_admin(
        &self,
        city_id: Option<Uuid>,
        event_id: Option<Uuid>,
    ) -> Result<Vec<AdminEvent>, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AdminEventRow> = sql_query(ADMIN_EVENTS_SQL.as_str())
            .bind::<Nullable<SqlUuid>, _>(city_id)
            .bind::<Nullable<SqlUuid>, _>(event_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| AdminEvent::try_from(row).map_err(EventRepositoryError::query))
            .collect()
    }
}

static ADMIN_EVENTS_SQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
SELECT {EVENT_WITH_CITY_COLUMNS},
    (SELECT COUNT(*) FROM event_registrations r
        WHERE r.event_id = e.id AND r.going) AS attending_count,
    (SELECT COUNT(*) FROM event_registrations r
        WHERE r.event_id = e.id AND NOT r.going) AS rejected_count,
    CASE
        WHEN e.city_id IS NULL THEN (SELECT COUNT(*) FROM users)
        ELSE (SELECT COUNT(*) FROM city_subscriptions s
            WHERE s.city_id = e.city_id AND s.deleted_at IS NULL)
    END AS subscriber_count
FROM events e
LEFT JOIN cities c ON c.id = e.city_id
WHERE ($1::uuid IS NULL OR e.city_id = $1)
  AND ($2::uuid IS NULL OR e.id = $2)
ORDER BY e.start_date DESC, e.id
"#
    )
});

fn map_pool_error(error: PoolError) -> EventRepositoryError {
    map_basic_pool_error(error, EventRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EventRepositoryError {
    map_unique_diesel_error(
        error,
        EventRepositoryError::query,
        EventRepositoryError::connection,
        EventRepositoryError::duplicate,
    )
}

fn map_transaction_error(error: diesel::result::Error) -> EventRepositoryError {
    map_transaction_diesel_error(error, EventRepositoryError::transaction)
}

#[async_trait]
impl EventRepository for DieselEventRepository {
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = events::table
            .find(id.as_uuid())
            .select(EventRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Event::from))
    }

    async fn exists_with_key(
        &self,
        key: &EventKey,
        excluding: Option<EventId>,
    ) -> Result<bool, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = events::table
            .filter(events::name.eq(&key.name))
            .filter(events::start_date.eq(key.start_date))
            .filter(events::end_date.eq(key.end_date))
            .into_boxed();
        query = match key.city_id {
            Some(city_id) => query.filter(events::city_id.eq(*city_id.as_uuid())),
            None => query.filter(events::city_id.is_null()),
        };
        if let Some(excluded) = excluding {
            query = query.filter(events::id.ne(*excluded.as_uuid()));
        }
        let count: i64 = query
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count > 0)
    }

    async fn insert(&self, event: &Event) -> Result<(), EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(events::table)
            .values(EventRecord::from(event))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, event: &Event) -> Result<(), EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(events::table.find(event.id.as_uuid()))
            .set(EventRecord::from(event))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(EventRepositoryError::query(format!("event {} vanished", event.id)));
        }
        Ok(())
    }

    async fn delete_cascade(&self, id: &EventId) -> Result<bool, EventRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let event_id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Interactions and registrations reference the event, so they go first.
        let deleted = conn
            .transaction(|conn| {
                async move {
                    diesel::delete(
                        message_interactions::table
                            .filter(message_interactions::event_id.eq(event_id)),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(
                        event_registrations::table
                            .filter(event_registrations::event_id.eq(event_id)),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(events::table.find(event_id))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_transaction_error)?;
        Ok(deleted > 0)
    }

    async fn list_admin(
        &self,
        city_id: Option<CityId>,
    ) -> Result<Vec<AdminEvent>, EventRepositoryError> {
        self.load_admin(city_id.map(|id| *id.as_uuid()), None).await
    }

    async fn find_admin(&self, id: &EventId) -> Result<Option<AdminEvent>, EventRepositoryError> {
        let rows = self.load_admin(None, Some(*id.as_uuid())).await?;
        Ok(rows.into_iter().next())
    }
}
