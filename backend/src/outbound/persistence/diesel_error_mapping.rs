//! Shared Diesel error mapping for the fleet repositories.
//!
//! Every repository port exposes `Connection` and `Query` variants, and the
//! writable ones a `Duplicate` variant. These helpers translate pool and
//! Diesel failures onto those constructors so each adapter only names its
//! own error type.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => connection(message),
        PoolError::Timeout => connection(PoolError::Timeout.to_string()),
    }
}

fn log_diesel_error(error: &DieselError) {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            "diesel operation failed"
        ),
    }
}

/// Map common Diesel error variants into query/connection constructors.
///
/// `NotFound` and query-builder failures map to query errors; unique
/// violations are treated like any other database error.
pub(crate) fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: FnOnce(String) -> E,
    C: FnOnce(String) -> E,
{
    log_diesel_error(&error);

    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => query("database query error".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error".to_owned())
        }
        _ => query("database error".to_owned()),
    }
}

/// Like [`map_basic_diesel_error`] but routes unique violations to the
/// `duplicate` constructor, carrying the violated constraint name.
pub(crate) fn map_unique_diesel_error<E, Q, C, D>(
    error: DieselError,
    query: Q,
    connection: C,
    duplicate: D,
) -> E
where
    Q: FnOnce(String) -> E,
    C: FnOnce(String) -> E,
    D: FnOnce(String) -> E,
{
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &error {
        log_diesel_error(&error);
        let constraint = info.constraint_name().unwrap_or("unique constraint");
        return duplicate(constraint.to_owned());
    }
    map_basic_diesel_error(error, query, connection)
}

/// Map any failure of a multi-statement transaction onto one constructor.
///
/// A connection lost mid-transaction lands here too: the unit of work has
/// rolled back and the caller reports it as a failed transaction.
pub(crate) fn map_transaction_diesel_error<E, T>(error: DieselError, transaction: T) -> E
where
    T: FnOnce(String) -> E,
{
    log_diesel_error(&error);

    let message = match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            "connection lost during transaction"
        }
        DieselError::RollbackTransaction => "transaction rolled back",
        _ => "transaction failed",
    };
    transaction(message.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
        Duplicate(String),
    }

    struct Info(&'static str);

    impl diesel::result::DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn map(error: DieselError) -> Mapped {
        map_unique_diesel_error(error, Mapped::Query, Mapped::Connection, Mapped::Duplicate)
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Info("cities_name_key")),
        );
        assert_eq!(map(error), Mapped::Duplicate("cities_name_key".into()));
    }

    #[rstest]
    fn closed_connection_maps_to_connection() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new(Info("n/a")),
        );
        assert_eq!(map(error), Mapped::Connection("database connection error".into()));
    }

    #[rstest]
    fn not_found_maps_to_query() {
        assert_eq!(map(DieselError::NotFound), Mapped::Query("record not found".into()));
    }

    #[rstest]
    fn basic_mapping_ignores_unique_violation() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Info("events_identity_key")),
        );
        let mapped: Mapped = map_basic_diesel_error(error, Mapped::Query, Mapped::Connection);
        assert_eq!(mapped, Mapped::Query("database error".into()));
    }

    #[rstest]
    fn closed_connection_inside_a_transaction_is_a_transaction_failure() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new(Info("n/a")),
        );
        let mapped: Mapped = map_transaction_diesel_error(error, Mapped::Query);
        assert_eq!(
            mapped,
            Mapped::Query("connection lost during transaction".into())
        );
    }

    #[rstest]
    fn pool_errors_map_to_connection() {
        let mapped: Mapped =
            map_basic_pool_error(PoolError::checkout("timed out"), Mapped::Connection);
        assert_eq!(mapped, Mapped::Connection("timed out".into()));
    }
}
