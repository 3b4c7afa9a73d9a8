use std::sync::Arc;

use toolcrib_inventory::{AggregateEntry, InsertNumber};

use crate::error::StoreError;

/// Keyed store of running totals.
///
/// There is no `set`: totals only move through [`apply_delta`](AggregateStore::apply_delta),
/// which keeps every stored value explainable as a sum of ledger deltas.
#[async_trait::async_trait]
pub trait AggregateStore: Send + Sync {
    /// Current total, 0 if the insert has never been referenced.
    async fn get(&self, insert_number: &InsertNumber) -> Result<i64, StoreError>;

    /// Add `delta` to the total (creating the entry at `delta` if absent) and return the
    /// new total. The read-modify-write is atomic within the store.
    async fn apply_delta(&self, insert_number: &InsertNumber, delta: i64)
    -> Result<i64, StoreError>;

    /// Snapshot of every entry, in no particular order.
    async fn list_all(&self) -> Result<Vec<AggregateEntry>, StoreError>;

    /// Drop every entry (rebuild support).
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> AggregateStore for Arc<S>
where
    S: AggregateStore + ?Sized,
{
    async fn get(&self, insert_number: &InsertNumber) -> Result<i64, StoreError> {
        (**self).get(insert_number).await
    }

    async fn apply_delta(
        &self,
        insert_number: &InsertNumber,
        delta: i64,
    ) -> Result<i64, StoreError> {
        (**self).apply_delta(insert_number, delta).await
    }

    async fn list_all(&self) -> Result<Vec<AggregateEntry>, StoreError> {
        (**self).list_all().await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}
