use std::sync::RwLock;

use toolcrib_core::EventId;
use toolcrib_inventory::{InwardEvent, OutwardEvent, Recorded};

use super::r#trait::LedgerStore;
use crate::error::StoreError;

/// In-memory append-only ledger.
///
/// Intended for tests/dev. Listings copy the stream under a read lock.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inward: RwLock<Vec<Recorded<InwardEvent>>>,
    outward: RwLock<Vec<Recorded<OutwardEvent>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn append<E: Clone>(
        stream: &RwLock<Vec<Recorded<E>>>,
        event: E,
    ) -> Result<Recorded<E>, StoreError> {
        let mut stream = stream.write().map_err(|_| StoreError::LockPoisoned)?;
        let next = stream.len() as u64 + 1;
        let recorded = Recorded::new(EventId::new(), next, event);
        stream.push(recorded.clone());
        Ok(recorded)
    }

    fn snapshot<E: Clone>(stream: &RwLock<Vec<Recorded<E>>>) -> Result<Vec<Recorded<E>>, StoreError> {
        stream
            .read()
            .map(|s| s.clone())
            .map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append_inward(&self, event: InwardEvent) -> Result<Recorded<InwardEvent>, StoreError> {
        Self::append(&self.inward, event)
    }

    async fn append_outward(
        &self,
        event: OutwardEvent,
    ) -> Result<Recorded<OutwardEvent>, StoreError> {
        Self::append(&self.outward, event)
    }

    async fn list_inward(&self) -> Result<Vec<Recorded<InwardEvent>>, StoreError> {
        Self::snapshot(&self.inward)
    }

    async fn list_outward(&self) -> Result<Vec<Recorded<OutwardEvent>>, StoreError> {
        Self::snapshot(&self.outward)
    }
}
