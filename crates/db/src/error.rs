//! Mapping from database errors to the storage error the core understands.

use sea_orm::{DbErr, SqlErr};
use tellr_core::StoreError;

/// Driver messages that mean "try again".
const CONTENTION_MARKERS: &[&str] = &[
    "database is locked",
    "database table is locked",
    "busy",
    "deadlock",
    "could not serialize",
    "40001",
    "40P01",
];

/// Classifies a database error.
///
/// Lock contention and pool exhaustion are transient; unique violations are
/// duplicates; everything else means the backend is unavailable.
#[must_use]
pub fn store_error(err: DbErr) -> StoreError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return StoreError::Duplicate;
    }
    if matches!(err, DbErr::ConnectionAcquire(_)) {
        return StoreError::Busy;
    }

    let message = err.to_string();
    let lowered = message.to_lowercase();
    if CONTENTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(&marker.to_lowercase()))
    {
        StoreError::Busy
    } else {
        StoreError::Unavailable(message)
    }
}
