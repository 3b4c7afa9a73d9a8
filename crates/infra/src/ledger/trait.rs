use std::sync::Arc;

use toolcrib_inventory::{InwardEvent, OutwardEvent, Recorded};

use crate::error::StoreError;

/// Append-only store for the two movement streams.
///
/// ## Append Semantics
///
/// - Accepts only typed events, which cannot be built from malformed input
/// - Assigns the next `sequence_number` of the stream (last + 1, starting at 1) and a
///   fresh event id
/// - Persists atomically: either the whole event is stored or nothing is
/// - Never rewrites, reorders or deletes an earlier event
///
/// ## Load Semantics
///
/// Listings return every event of the stream in sequence order. Records read back
/// from durable storage are re-validated; a row that fails is reported as
/// [`StoreError::Corrupt`].
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append_inward(&self, event: InwardEvent) -> Result<Recorded<InwardEvent>, StoreError>;

    async fn append_outward(
        &self,
        event: OutwardEvent,
    ) -> Result<Recorded<OutwardEvent>, StoreError>;

    async fn list_inward(&self) -> Result<Vec<Recorded<InwardEvent>>, StoreError>;

    async fn list_outward(&self) -> Result<Vec<Recorded<OutwardEvent>>, StoreError>;
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn append_inward(&self, event: InwardEvent) -> Result<Recorded<InwardEvent>, StoreError> {
        (**self).append_inward(event).await
    }

    async fn append_outward(
        &self,
        event: OutwardEvent,
    ) -> Result<Recorded<OutwardEvent>, StoreError> {
        (**self).append_outward(event).await
    }

    async fn list_inward(&self) -> Result<Vec<Recorded<InwardEvent>>, StoreError> {
        (**self).list_inward().await
    }

    async fn list_outward(&self) -> Result<Vec<Recorded<OutwardEvent>>, StoreError> {
        (**self).list_outward().await
    }
}
