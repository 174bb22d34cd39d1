//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Store implementations for accounts, the ledger and idempotency keys
//! - Database migrations

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

pub use error::store_error;
pub use repositories::{AccountRepository, IdempotencyRepository, LedgerRepository};

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tellr_shared::config::DatabaseConfig;
use tracing::info;

/// Establishes a connection pool to the configured database.
///
/// An in-memory SQLite database lives only as long as its connection, so the
/// pool is pinned to one connection for `sqlite::memory:` URLs.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let in_memory = config.url.starts_with("sqlite") && config.url.contains(":memory:");
    let (max, min) = if in_memory {
        (1, 1)
    } else {
        (config.max_connections, config.min_connections)
    };

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(max)
        .min_connections(min)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(backend = ?db.get_database_backend(), max_connections = max, "Database connected");
    Ok(db)
}
