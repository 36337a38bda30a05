//! PostgreSQL-backed `EventRegistrationRepository`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EventRegistrationRepository, EventRegistrationRepositoryError};
use crate::domain::{EventId, EventRegistration, UserId};

use super::diesel_error_mapping::{map_basic_pool_error, map_unique_diesel_error};
use super::models::EventRegistrationRow;
use super::pool::{DbPool, PoolError};
use super::schema::event_registrations;

/// Diesel-backed implementation of the registration repository port.
#[derive(Clone)]
pub struct DieselEventRegistrationRepository {
    pool: DbPool,
}

impl DieselEventRegistrationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EventRegistrationRepositoryError {
    map_basic_pool_error(error, EventRegistrationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EventRegistrationRepositoryError {
    map_unique_diesel_error(
        error,
        EventRegistrationRepositoryError::query,
        EventRegistrationRepositoryError::connection,
        EventRegistrationRepositoryError::duplicate,
    )
}

impl From<EventRegistrationRow> for EventRegistration {
    fn from(row: EventRegistrationRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            event_id: EventId::from(row.event_id),
            going: row.going,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&EventRegistration> for EventRegistrationRow {
    fn from(registration: &EventRegistration) -> Self {
        Self {
            user_id: *registration.user_id.as_uuid(),
            event_id: *registration.event_id.as_uuid(),
            going: registration.going,
            created_at: registration.created_at,
            updated_at: registration.updated_at,
        }
    }
}

#[async_trait]
impl EventRegistrationRepository for DieselEventRegistrationRepository {
    async fn find(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<EventRegistration>, EventRegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = event_registrations::table
            .find((user_id.as_uuid(), event_id.as_uuid()))
            .select(EventRegistrationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(EventRegistration::from))
    }

    async fn insert(
        &self,
        registration: &EventRegistration,
    ) -> Result<(), EventRegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(event_registrations::table)
            .values(EventRegistrationRow::from(registration))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_going(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        going: bool,
    ) -> Result<bool, EventRegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            event_registrations::table.find((user_id.as_uuid(), event_id.as_uuid())),
        )
        .set((
            event_registrations::going.eq(going),
            event_registrations::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }
}
