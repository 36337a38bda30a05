//! PostgreSQL-backed `PushTokenRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{PushTokenRepository, PushTokenRepositoryError};
use crate::domain::{
    CityId, EndpointArn, PushEndpoint, PushSubscription, PushToken, PushTokenId, SubscriptionArn,
    UserId,
};

use super::diesel_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_unique_diesel_error,
};
use super::models::{PushSubscriptionArnRow, PushTokenRow};
use super::pool::{DbPool, PoolError};
use super::schema::{city_subscriptions, push_subscription_arns, push_tokens};

/// Diesel-backed implementation of the push token repository port.
#[derive(Clone)]
pub struct DieselPushTokenRepository {
    pool: DbPool,
}

impl DieselPushTokenRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PushTokenRepositoryError {
    map_basic_pool_error(error, PushTokenRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PushTokenRepositoryError {
    map_unique_diesel_error(
        error,
        PushTokenRepositoryError::query,
        PushTokenRepositoryError::connection,
        PushTokenRepositoryError::duplicate,
    )
}

fn to_subscription(row: PushSubscriptionArnRow) -> PushSubscription {
    PushSubscription {
        user_id: UserId::from_uuid(row.user_id),
        push_token_id: PushTokenId::from(row.push_token_id),
        arn: SubscriptionArn::new(row.arn),
    }
}

#[async_trait]
impl PushTokenRepository for DieselPushTokenRepository {
    async fn enabled_endpoints_for_city(
        &self,
        city_id: &CityId,
    ) -> Result<Vec<PushEndpoint>, PushTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let subscribers = city_subscriptions::table
            .filter(city_subscriptions::city_id.eq(*city_id.as_uuid()))
            .filter(city_subscriptions::deleted_at.is_null())
            .select(city_subscriptions::user_id);
        let rows: Vec<(Uuid, String)> = push_tokens::table
            .filter(push_tokens::enabled.eq(true))
            .filter(push_tokens::user_id.eq_any(subscribers))
            .select((push_tokens::id, push_tokens::endpoint_arn))
            .order_by(push_tokens::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(id, endpoint_arn)| PushEndpoint {
                token_id: PushTokenId::from(id),
                endpoint_arn: EndpointArn::new(endpoint_arn),
            })
            .collect())
    }

    async fn disable(&self, ids: &[PushTokenId]) -> Result<u64, PushTokenRepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(push_tokens::table.filter(push_tokens::id.eq_any(ids)))
            .set(push_tokens::enabled.eq(false))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated as u64)
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<PushToken>, PushTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = push_tokens::table
            .filter(push_tokens::token.eq(token))
            .select(PushTokenRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(PushToken::from))
    }

    async fn find_by_id(
        &self,
        id: &PushTokenId,
    ) -> Result<Option<PushToken>, PushTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = push_tokens::table
            .find(id.as_uuid())
            .select(PushTokenRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(PushToken::from))
    }

    async fn insert(&self, token: &PushToken) -> Result<(), PushTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(push_tokens::table)
            .values(PushTokenRow::from(token))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn set_enabled(
        &self,
        id: &PushTokenId,
        enabled: bool,
    ) -> Result<(), PushTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(push_tokens::table.find(id.as_uuid()))
            .set(push_tokens::enabled.eq(enabled))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn add_subscription(
        &self,
        subscription: &PushSubscription,
    ) -> Result<(), PushTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(push_subscription_arns::table)
            .values(PushSubscriptionArnRow {
                push_token_id: *subscription.push_token_id.as_uuid(),
                user_id: *subscription.user_id.as_uuid(),
                arn: subscription.arn.as_str().to_owned(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn subscriptions_for_token(
        &self,
        id: &PushTokenId,
    ) -> Result<Vec<PushSubscription>, PushTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PushSubscriptionArnRow> = push_subscription_arns::table
            .filter(push_subscription_arns::push_token_id.eq(id.as_uuid()))
            .select(PushSubscriptionArnRow::as_select())
            .order_by(push_subscription_arns::created_at)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(to_subscription).collect())
    }

    async fn delete_with_subscriptions(
        &self,
        id: &PushTokenId,
    ) -> Result<(), PushTokenRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let token_id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::delete(
                    push_subscription_arns::table
                        .filter(push_subscription_arns::push_token_id.eq(token_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(push_tokens::table.find(token_id))
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| {
            map_basic_diesel_error(
                error,
                PushTokenRepositoryError::query,
                PushTokenRepositoryError::connection,
            )
        })
    }
}
