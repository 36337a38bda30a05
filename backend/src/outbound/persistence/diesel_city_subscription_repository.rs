//! PostgreSQL-backed `CitySubscriptionRepository`.
//!
//! Unsubscribing stamps `deleted_at`; subscribing again clears it through an
//! upsert so the pair keeps a single row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Timestamptz, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CitySubscriptionRepository, CitySubscriptionRepositoryError};
use crate::domain::{City, CityId, CitySubscription, CitySubscriptionSummary, UserId};

use super::diesel_error_mapping::{map_basic_pool_error, map_unique_diesel_error};
use super::models::{CityRow, CitySubscriptionRow, CitySummaryRow, count_from_db};
use super::pool::{DbPool, PoolError};
use super::schema::{cities, city_subscriptions};

/// Diesel-backed implementation of the subscription repository port.
#[derive(Clone)]
pub struct DieselCitySubscriptionRepository {
    pool: DbPool,
}

impl DieselCitySubscriptionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SUBSCRIBE_SQL: &str = r#"
INSERT INTO city_subscriptions (user_id, city_id, created_at, deleted_at)
VALUES ($1, $2, $3, NULL)
ON CONFLICT (user_id, city_id)
DO UPDATE SET deleted_at = NULL, created_at = EXCLUDED.created_at
WHERE city_subscriptions.deleted_at IS NOT NULL
"#;

const SUMMARIES_SQL: &str = r#"
SELECT c.*, COUNT(s.user_id) AS subscriber_count
FROM city_subscriptions s
RIGHT JOIN cities c ON c.id = s.city_id AND s.deleted_at IS NULL
GROUP BY c.id
ORDER BY c.name
"#;

fn map_pool_error(error: PoolError) -> CitySubscriptionRepositoryError {
    map_basic_pool_error(error, CitySubscriptionRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CitySubscriptionRepositoryError {
    map_unique_diesel_error(
        error,
        CitySubscriptionRepositoryError::query,
        CitySubscriptionRepositoryError::connection,
        CitySubscriptionRepositoryError::duplicate,
    )
}

fn to_city(row: CityRow) -> Result<City, CitySubscriptionRepositoryError> {
    City::try_from(row).map_err(CitySubscriptionRepositoryError::query)
}

fn to_subscription(row: CitySubscriptionRow) -> CitySubscription {
    CitySubscription {
        user_id: UserId::from_uuid(row.user_id),
        city_id: CityId::from(row.city_id),
        created_at: row.created_at,
    }
}

#[async_trait]
impl CitySubscriptionRepository for DieselCitySubscriptionRepository {
    async fn find_active(
        &self,
        user_id: &UserId,
        city_id: &CityId,
    ) -> Result<Option<CitySubscription>, CitySubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = city_subscriptions::table
            .filter(city_subscriptions::user_id.eq(user_id.as_uuid()))
            .filter(city_subscriptions::city_id.eq(city_id.as_uuid()))
            .filter(city_subscriptions::deleted_at.is_null())
            .select(CitySubscriptionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(to_subscription))
    }

    async fn subscribe(
        &self,
        subscription: &CitySubscription,
    ) -> Result<(), CitySubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = sql_query(SUBSCRIBE_SQL)
            .bind::<SqlUuid, _>(subscription.user_id.as_uuid())
            .bind::<SqlUuid, _>(subscription.city_id.as_uuid())
            .bind::<Timestamptz, _>(subscription.created_at)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if affected == 0 {
            return Err(CitySubscriptionRepositoryError::duplicate(format!(
                "user {} and city {}",
                subscription.user_id, subscription.city_id
            )));
        }
        Ok(())
    }

    async fn unsubscribe(
        &self,
        user_id: &UserId,
        city_id: &CityId,
        at: DateTime<Utc>,
    ) -> Result<bool, CitySubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(
            city_subscriptions::table
                .filter(city_subscriptions::user_id.eq(user_id.as_uuid()))
                .filter(city_subscriptions::city_id.eq(city_id.as_uuid()))
                .filter(city_subscriptions::deleted_at.is_null()),
        )
        .set(city_subscriptions::deleted_at.eq(Some(at)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }

    async fn subscribed_cities(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<City>, CitySubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CityRow> = city_subscriptions::table
            .inner_join(cities::table)
            .filter(city_subscriptions::user_id.eq(user_id.as_uuid()))
            .filter(city_subscriptions::deleted_at.is_null())
            .select(CityRow::as_select())
            .order_by(cities::name.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_city).collect()
    }

    async fn subscriptions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CitySubscription>, CitySubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CitySubscriptionRow> = city_subscriptions::table
            .inner_join(cities::table)
            .filter(city_subscriptions::user_id.eq(user_id.as_uuid()))
            .filter(city_subscriptions::deleted_at.is_null())
            .select(CitySubscriptionRow::as_select())
            .order_by(cities::name.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(to_subscription).collect())
    }

    async fn summaries(
        &self,
    ) -> Result<Vec<CitySubscriptionSummary>, CitySubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CitySummaryRow> = sql_query(SUMMARIES_SQL)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| {
                Ok(CitySubscriptionSummary {
                    city: to_city(row.city)?,
                    subscriber_count: count_from_db(row.subscriber_count),
                })
            })
            .collect()
    }
}
