//! SQLite-backed ledger.
//!
//! Each stream is its own table; `seq INTEGER PRIMARY KEY AUTOINCREMENT` supplies the
//! stream position. Appends are single `INSERT .. RETURNING` statements, so an event is
//! either fully stored or absent.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use toolcrib_core::{EventId, Username};
use toolcrib_events::Event;
use toolcrib_inventory::{
    InsertNumber, InwardEvent, OpCode, OutwardEvent, Quantity, Recorded, ToolNumber,
};

use super::r#trait::LedgerStore;
use crate::db::map_sqlx_error;
use crate::error::StoreError;

/// Durable ledger on a shared SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Wrap a pool whose schema has been initialized with [`crate::db::init_schema`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LedgerStore for SqliteLedgerStore {
    #[instrument(skip(self, event), fields(insert_number = %event.insert_number()), err)]
    async fn append_inward(&self, event: InwardEvent) -> Result<Recorded<InwardEvent>, StoreError> {
        let event_id = EventId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO inward_events (event_id, username, occurred_at, insert_number, quantity)
            VALUES (?, ?, ?, ?, ?)
            RETURNING seq
            "#,
        )
        .bind(event_id.to_string())
        .bind(event.user().as_str())
        .bind(event.occurred_at())
        .bind(event.insert_number().as_str())
        .bind(event.quantity().as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_inward", e))?;

        let seq = sequence(&row, "append_inward")?;
        Ok(Recorded::new(event_id, seq, event))
    }

    #[instrument(skip(self, event), fields(insert_number = %event.insert_number()), err)]
    async fn append_outward(
        &self,
        event: OutwardEvent,
    ) -> Result<Recorded<OutwardEvent>, StoreError> {
        let event_id = EventId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO outward_events
                (event_id, username, occurred_at, insert_number, op_code, tool_number, quantity)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING seq
            "#,
        )
        .bind(event_id.to_string())
        .bind(event.user().as_str())
        .bind(event.occurred_at())
        .bind(event.insert_number().as_str())
        .bind(event.op_code().as_str())
        .bind(event.tool_number().as_str())
        .bind(event.quantity().as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_outward", e))?;

        let seq = sequence(&row, "append_outward")?;
        Ok(Recorded::new(event_id, seq, event))
    }

    #[instrument(skip(self), err)]
    async fn list_inward(&self) -> Result<Vec<Recorded<InwardEvent>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT seq, event_id, username, occurred_at, insert_number, quantity
            FROM inward_events
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inward", e))?;

        rows.iter().map(decode_inward).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_outward(&self) -> Result<Vec<Recorded<OutwardEvent>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT seq, event_id, username, occurred_at, insert_number, op_code, tool_number, quantity
            FROM outward_events
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_outward", e))?;

        rows.iter().map(decode_outward).collect()
    }
}

fn sequence(row: &SqliteRow, operation: &str) -> Result<u64, StoreError> {
    let seq: i64 = row
        .try_get("seq")
        .map_err(|e| map_sqlx_error(operation, e))?;
    u64::try_from(seq).map_err(|_| StoreError::Corrupt(format!("negative seq {seq} in {operation}")))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| map_sqlx_error("decode", e))
}

fn corrupt(what: &str) -> impl Fn(toolcrib_core::DomainError) -> StoreError + '_ {
    move |e| StoreError::Corrupt(format!("{what}: {e}"))
}

fn decode_inward(row: &SqliteRow) -> Result<Recorded<InwardEvent>, StoreError> {
    let seq = sequence(row, "list_inward")?;
    let event_id: EventId = column::<String>(row, "event_id")?
        .parse()
        .map_err(corrupt("inward event_id"))?;
    let occurred_at: DateTime<Utc> = column(row, "occurred_at")?;

    let event = InwardEvent::new(
        Username::new(column::<String>(row, "username")?).map_err(corrupt("inward username"))?,
        occurred_at,
        InsertNumber::new(column::<String>(row, "insert_number")?)
            .map_err(corrupt("inward insert_number"))?,
        Quantity::new(column::<i64>(row, "quantity")?).map_err(corrupt("inward quantity"))?,
    );
    Ok(Recorded::new(event_id, seq, event))
}

fn decode_outward(row: &SqliteRow) -> Result<Recorded<OutwardEvent>, StoreError> {
    let seq = sequence(row, "list_outward")?;
    let event_id: EventId = column::<String>(row, "event_id")?
        .parse()
        .map_err(corrupt("outward event_id"))?;
    let occurred_at: DateTime<Utc> = column(row, "occurred_at")?;

    let quantity: i64 = column(row, "quantity")?;
    if quantity != 1 {
        return Err(StoreError::Corrupt(format!(
            "outward event {event_id} has quantity {quantity}"
        )));
    }

    let event = OutwardEvent::new(
        Username::new(column::<String>(row, "username")?).map_err(corrupt("outward username"))?,
        occurred_at,
        InsertNumber::new(column::<String>(row, "insert_number")?)
            .map_err(corrupt("outward insert_number"))?,
        column::<String>(row, "op_code")?
            .parse::<OpCode>()
            .map_err(corrupt("outward op_code"))?,
        ToolNumber::new(column::<String>(row, "tool_number")?)
            .map_err(corrupt("outward tool_number"))?,
    );
    Ok(Recorded::new(event_id, seq, event))
}
