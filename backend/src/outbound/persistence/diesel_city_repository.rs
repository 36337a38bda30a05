//! PostgreSQL-backed `CityRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CityRepository, CityRepositoryError};
use crate::domain::{City, CityId};

use super::diesel_error_mapping::{
    map_basic_pool_error, map_transaction_diesel_error, map_unique_diesel_error,
};
use super::models::{CityRecord, CityRow, count_from_db};
use super::pool::{DbPool, PoolError};
use super::schema::{cities, city_subscriptions, events};

/// Diesel-backed implementation of the city repository port.
#[derive(Clone)]
pub struct DieselCityRepository {
    pool: DbPool,
}

impl DieselCityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CityRepositoryError {
    map_basic_pool_error(error, CityRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CityRepositoryError {
    map_unique_diesel_error(
        error,
        CityRepositoryError::query,
        CityRepositoryError::connection,
        CityRepositoryError::duplicate,
    )
}

fn map_transaction_error(error: diesel::result::Error) -> CityRepositoryError {
    map_transaction_diesel_error(error, CityRepositoryError::query)
}

fn to_city(row: CityRow) -> Result<City, CityRepositoryError> {
    City::try_from(row).map_err(CityRepositoryError::query)
}

#[async_trait]
impl CityRepository for DieselCityRepository {
    async fn find_by_id(&self, id: &CityId) -> Result<Option<City>, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = cities::table
            .find(id.as_uuid())
            .select(CityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_city).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<City>, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = cities::table
            .filter(cities::name.eq(name))
            .select(CityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_city).transpose()
    }

    async fn list(&self) -> Result<Vec<City>, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CityRow> = cities::table
            .select(CityRow::as_select())
            .order_by(cities::name.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_city).collect()
    }

    async fn insert(&self, city: &City) -> Result<(), CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(cities::table)
            .values(CityRecord::from(city))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, city: &City) -> Result<(), CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(cities::table.find(city.id.as_uuid()))
            .set(CityRecord::from(city))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(CityRepositoryError::query(format!("city {} vanished", city.id)));
        }
        Ok(())
    }

    async fn count_events(&self, id: &CityId) -> Result<u64, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = events::table
            .filter(events::city_id.eq(id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_from_db(count))
    }

    async fn delete_with_subscriptions(&self, id: &CityId) -> Result<(), CityRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let city_id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::delete(
                    city_subscriptions::table.filter(city_subscriptions::city_id.eq(city_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(cities::table.find(city_id))
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_transaction_error)
    }
}

#[cfg(test)]
mod tests {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DieselError::RollbackTransaction)]
    #[case(DieselError::DatabaseError(
        DatabaseErrorKind::ClosedConnection,
        Box::new(String::from("server closed the connection")),
    ))]
    fn failed_removal_is_a_query_error(#[case] error: DieselError) {
        assert!(matches!(
            map_transaction_error(error),
            CityRepositoryError::Query { .. }
        ));
    }
}
