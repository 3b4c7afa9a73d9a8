//! SQLite-backed totals table.
//!
//! `apply_delta` is a single upsert with `RETURNING`, so find-or-create and the addition
//! happen in one statement under SQLite's write lock. A sum outside the i64 range is refused.

use sqlx::{Row, SqlitePool};
use tracing::instrument;

use toolcrib_inventory::{AggregateEntry, InsertNumber};

use super::r#trait::AggregateStore;
use crate::db::map_sqlx_error;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct SqliteAggregateStore {
    pool: SqlitePool,
}

impl SqliteAggregateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AggregateStore for SqliteAggregateStore {
    async fn get(&self, insert_number: &InsertNumber) -> Result<i64, StoreError> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT total_quantity FROM aggregate_totals WHERE insert_number = ?",
        )
        .bind(insert_number.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_total", e))?;

        Ok(total.unwrap_or(0))
    }

    #[instrument(skip(self), fields(insert_number = %insert_number), err)]
    async fn apply_delta(
        &self,
        insert_number: &InsertNumber,
        delta: i64,
    ) -> Result<i64, StoreError> {
        // SQLite promotes an overflowing integer sum to REAL instead of failing, so the
        // update is guarded against the i64 bounds. A refused update returns no row.
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO aggregate_totals (insert_number, total_quantity)
            VALUES (?, ?)
            ON CONFLICT (insert_number)
            DO UPDATE SET total_quantity = aggregate_totals.total_quantity + excluded.total_quantity
            WHERE (excluded.total_quantity > 0
                   AND aggregate_totals.total_quantity <= ? - excluded.total_quantity)
               OR (excluded.total_quantity <= 0
                   AND aggregate_totals.total_quantity >= ? - excluded.total_quantity)
            RETURNING total_quantity
            "#,
        )
        .bind(insert_number.as_str())
        .bind(delta)
        .bind(i64::MAX)
        .bind(i64::MIN)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("apply_delta", e))?;

        total.ok_or_else(|| StoreError::Overflow(insert_number.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<AggregateEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT insert_number, total_quantity FROM aggregate_totals ORDER BY insert_number",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_totals", e))?;

        rows.iter()
            .map(|row| {
                let raw: String = row
                    .try_get("insert_number")
                    .map_err(|e| map_sqlx_error("list_totals", e))?;
                let insert_number = InsertNumber::new(&raw)
                    .map_err(|e| StoreError::Corrupt(format!("aggregate key '{raw}': {e}")))?;
                let total_quantity = row
                    .try_get("total_quantity")
                    .map_err(|e| map_sqlx_error("list_totals", e))?;
                Ok(AggregateEntry {
                    insert_number,
                    total_quantity,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM aggregate_totals")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_totals", e))?;
        Ok(())
    }
}
