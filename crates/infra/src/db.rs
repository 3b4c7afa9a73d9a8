//! SQLite connection pool and schema bootstrap.
//!
//! ## Layout
//!
//! | Table | Role |
//! |-------|------|
//! | `inward_events` | append-only inward stream, `seq` is the stream position |
//! | `outward_events` | append-only outward stream |
//! | `aggregate_totals` | running total keyed by insert number |
//! | `users` | username → Argon2id hash |
//!
//! Ledger immutability is enforced by the database itself: `UPDATE` and `DELETE` on the
//! event tables abort via triggers.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{info, instrument};

use crate::config::StorageConfig;
use crate::error::StoreError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS inward_events (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        occurred_at TEXT NOT NULL,
        insert_number TEXT NOT NULL CHECK (length(trim(insert_number)) > 0),
        quantity INTEGER NOT NULL CHECK (quantity > 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS outward_events (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        occurred_at TEXT NOT NULL,
        insert_number TEXT NOT NULL CHECK (length(trim(insert_number)) > 0),
        op_code TEXT NOT NULL CHECK (op_code IN (
            'OP10', 'OP20', 'OP30', 'OP40', 'OP50', 'OP60', 'OP70', 'OP80', 'OP90', 'OP100'
        )),
        tool_number TEXT NOT NULL CHECK (length(trim(tool_number)) > 0),
        quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity = 1)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS inward_events_insert_number ON inward_events (insert_number)",
    "CREATE INDEX IF NOT EXISTS outward_events_insert_number ON outward_events (insert_number)",
    r#"
    CREATE TRIGGER IF NOT EXISTS inward_events_immutable_update
    BEFORE UPDATE ON inward_events
    BEGIN
        SELECT RAISE(ABORT, 'ledger events are immutable');
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS inward_events_immutable_delete
    BEFORE DELETE ON inward_events
    BEGIN
        SELECT RAISE(ABORT, 'ledger events are immutable');
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS outward_events_immutable_update
    BEFORE UPDATE ON outward_events
    BEGIN
        SELECT RAISE(ABORT, 'ledger events are immutable');
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS outward_events_immutable_delete
    BEFORE DELETE ON outward_events
    BEGIN
        SELECT RAISE(ABORT, 'ledger events are immutable');
    END
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS aggregate_totals (
        insert_number TEXT PRIMARY KEY NOT NULL,
        total_quantity INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY NOT NULL,
        password_hash TEXT NOT NULL
    )
    "#,
];

/// Open (creating if absent) the database named by `config.database_url`.
#[instrument(skip(config), fields(url = %config.database_url), err)]
pub async fn connect(config: &StorageConfig) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| map_sqlx_error("connect", e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Private in-memory database on a single connection.
///
/// Every SQLite `:memory:` connection is its own database, so the pool is pinned to
/// one connection that is never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| map_sqlx_error("connect_in_memory", e))?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error("connect_in_memory", e))
}

/// Create every table, index and trigger that does not exist yet.
#[instrument(skip(pool), err)]
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("init_schema", e))?;
    }
    info!(statements = SCHEMA.len(), "schema ready");
    Ok(())
}

/// Map SQLx errors to `StoreError`.
///
/// Decode failures mean a row no longer matches the domain types and are reported as
/// corruption; everything else is a backend failure.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("column {index} in {operation}: {source}"))
        }
        sqlx::Error::ColumnNotFound(column) => {
            StoreError::Corrupt(format!("column '{column}' missing in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

        assert_eq!(
            tables,
            vec!["aggregate_totals", "inward_events", "outward_events", "users"]
        );
    }

    #[tokio::test]
    async fn ledger_rows_cannot_be_rewritten() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO inward_events (event_id, username, occurred_at, insert_number, quantity) \
             VALUES ('e1', 'alice', '2026-01-01T00:00:00Z', 'A1', 3)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let update = sqlx::query("UPDATE inward_events SET quantity = 30")
            .execute(&pool)
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM inward_events").execute(&pool).await;
        assert!(delete.is_err());
    }
}
