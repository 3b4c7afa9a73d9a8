use std::collections::HashMap;
use std::sync::RwLock;

use toolcrib_inventory::{AggregateEntry, InsertNumber};

use super::r#trait::AggregateStore;
use crate::error::StoreError;

/// In-memory totals table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAggregateStore {
    totals: RwLock<HashMap<InsertNumber, i64>>,
}

impl InMemoryAggregateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AggregateStore for InMemoryAggregateStore {
    async fn get(&self, insert_number: &InsertNumber) -> Result<i64, StoreError> {
        let totals = self.totals.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(totals.get(insert_number).copied().unwrap_or(0))
    }

    async fn apply_delta(
        &self,
        insert_number: &InsertNumber,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut totals = self.totals.write().map_err(|_| StoreError::LockPoisoned)?;
        let total = totals.entry(insert_number.clone()).or_insert(0);
        *total = total
            .checked_add(delta)
            .ok_or_else(|| StoreError::Overflow(insert_number.to_string()))?;
        Ok(*total)
    }

    async fn list_all(&self) -> Result<Vec<AggregateEntry>, StoreError> {
        let totals = self.totals.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(totals
            .iter()
            .map(|(insert_number, total)| AggregateEntry {
                insert_number: insert_number.clone(),
                total_quantity: *total,
            })
            .collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.totals
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::insert;

    #[tokio::test]
    async fn absent_insert_reads_as_zero_without_creating_an_entry() {
        let store = InMemoryAggregateStore::new();
        assert_eq!(store.get(&insert("A1")).await.unwrap(), 0);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deltas_accumulate_and_may_go_negative() {
        let store = InMemoryAggregateStore::new();
        assert_eq!(store.apply_delta(&insert("A1"), -1).await.unwrap(), -1);
        assert_eq!(store.apply_delta(&insert("A1"), 10).await.unwrap(), 9);
        assert_eq!(store.get(&insert("A1")).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn overflow_is_reported_not_wrapped() {
        let store = InMemoryAggregateStore::new();
        store.apply_delta(&insert("A1"), i64::MAX).await.unwrap();
        let err = store.apply_delta(&insert("A1"), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Overflow(_)));
        assert_eq!(store.get(&insert("A1")).await.unwrap(), i64::MAX);
    }

    #[tokio::test]
    async fn clear_discards_everything() {
        let store = InMemoryAggregateStore::new();
        store.apply_delta(&insert("A1"), 3).await.unwrap();
        store.apply_delta(&insert("B2"), 4).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
