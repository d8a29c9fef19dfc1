//! For interacting with the database.

use super::config::DatabaseConfig;
use log::LevelFilter;
use sqlx::{
    pool::PoolOptions,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    ConnectOptions, Sqlite, SqlitePool, Transaction,
};
use std::time::Duration;

/// A common transaction type.
/// Use this for the business and persistence layer.
pub type Tx = Transaction<'static, Sqlite>;

/// A common database connection type.
pub type DbConnection = sqlx::pool::PoolConnection<Sqlite>;

/// A common database pool type.
pub type DbPool = SqlitePool;

/// Opens the database based on some configuration.
pub fn init_db(config: &DatabaseConfig) -> DbPool {
    let db_options = SqliteConnectOptions::new()
        .filename(&config.filename)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .log_statements(LevelFilter::Debug);
    let db: DbPool = PoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .max_connections(config.max_connections)
        .connect_lazy_with(db_options);
    db
}
