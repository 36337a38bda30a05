//! PostgreSQL-backed `BoardFirmwareQuery`.
//!
//! A board is outdated when its firmware differs from the most recently
//! released build, including boards that never reported a version.

use async_trait::async_trait;
use diesel::sql_query;
use diesel::sql_types::{Nullable, Text, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BoardFirmwareQuery, BoardFirmwareQueryError};
use crate::domain::{BoardFirmwareNotice, UserId};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::{DbPool, PoolError};

/// Diesel-backed implementation of the firmware lookup port.
#[derive(Clone)]
pub struct DieselBoardFirmwareQuery {
    pool: DbPool,
}

impl DieselBoardFirmwareQuery {
    /// Create a new query adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const OUTDATED_BOARDS_SQL: &str = r#"
WITH latest AS (
    SELECT version FROM firmware_releases ORDER BY released_at DESC LIMIT 1
)
SELECT b.serial_number, b.firmware_version AS current_version, latest.version AS latest_version
FROM boards b
CROSS JOIN latest
WHERE b.user_id = $1
  AND b.firmware_version IS DISTINCT FROM latest.version
ORDER BY b.serial_number
"#;

#[derive(Debug, diesel::QueryableByName)]
struct OutdatedBoardRow {
    #[diesel(sql_type = Text)]
    serial_number: String,
    #[diesel(sql_type = Nullable<Text>)]
    current_version: Option<String>,
    #[diesel(sql_type = Text)]
    latest_version: String,
}

fn map_pool_error(error: PoolError) -> BoardFirmwareQueryError {
    map_basic_pool_error(error, BoardFirmwareQueryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BoardFirmwareQueryError {
    map_basic_diesel_error(
        error,
        BoardFirmwareQueryError::query,
        BoardFirmwareQueryError::connection,
    )
}

#[async_trait]
impl BoardFirmwareQuery for DieselBoardFirmwareQuery {
    async fn outdated_boards(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<BoardFirmwareNotice>, BoardFirmwareQueryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OutdatedBoardRow> = sql_query(OUTDATED_BOARDS_SQL)
            .bind::<SqlUuid, _>(user_id.as_uuid())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| BoardFirmwareNotice {
                serial_number: row.serial_number,
                current_version: row.current_version,
                latest_version: row.latest_version,
            })
            .collect())
    }
}
