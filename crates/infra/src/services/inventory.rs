//! Movement recording pipeline (ledger first, aggregate second).
//!
//! ## Commit Flow
//!
//! ```text
//! RecordInward / RecordOutward
//!   ↓
//! 1. Validate (pure): raw input → typed event, or Validation
//!   ↓
//! 2. Take the rebuild gate (shared) and the insert-number lock
//!   ↓
//! 3. Append the event to the ledger
//!   ↓
//! 4. Apply the signed delta to the aggregate
//! ```
//!
//! The ledger is the write-ahead log. A failed append aborts before the aggregate is
//! touched. A failed aggregate update after a successful append leaves the ledger
//! authoritative: the caller gets [`InventoryError::AggregateDiverged`], the service
//! raises its `needs_rebuild` flag, and [`InventoryService::rebuild_aggregate`] brings the
//! totals back in line.
//!
//! ## Concurrency
//!
//! - Commits on the same insert number are serialized by a per-key async mutex, so the
//!   per-insert ledger order equals commit order
//! - Commits on different insert numbers run concurrently
//! - Rebuild and consistency checks hold the gate exclusively; no commit can interleave
//!   with a replay

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use toolcrib_core::{DomainError, EventId};
use toolcrib_inventory::{
    AggregateEntry, Drift, InsertNumber, InwardEvent, OutwardEvent, Recorded, RecordInward,
    RecordOutward, StockTotals,
};

use crate::aggregate::AggregateStore;
use crate::error::StoreError;
use crate::ledger::LedgerStore;
use crate::locks::KeyedLocks;

/// Inventory service failure.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The request was rejected before anything was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A store failed; nothing was committed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// The event is in the ledger but its delta did not reach the aggregate.
    ///
    /// The movement *is* recorded; retrying it would record it twice. Rebuild the
    /// aggregate instead.
    #[error("event {event_id} recorded but aggregate not updated: {source}")]
    AggregateDiverged { event_id: EventId, source: StoreError },
}

impl InventoryError {
    /// Whether the same request may be submitted again unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            InventoryError::Storage(e) => e.is_retryable(),
            InventoryError::Validation(_) | InventoryError::AggregateDiverged { .. } => false,
        }
    }
}

impl From<DomainError> for InventoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                InventoryError::Validation(msg)
            }
        }
    }
}

/// A recorded movement together with the new total for its insert number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committed<E> {
    pub event: Recorded<E>,
    pub total: i64,
}

/// Outcome of comparing the aggregate against a replay of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub inward_events: usize,
    pub outward_events: usize,
    /// Every insert number whose stored total differs from the replayed one.
    pub drift: Vec<Drift>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty()
    }
}

/// Raises `needs_rebuild` if dropped while armed.
///
/// Covers the window between a successful ledger append and the matching aggregate
/// update: if the commit future is dropped there (client gone, timeout), the event is
/// in the ledger without its delta.
struct PendingDelta<'a> {
    needs_rebuild: &'a AtomicBool,
    insert_number: &'a InsertNumber,
    event_id: EventId,
    armed: bool,
}

impl<'a> PendingDelta<'a> {
    fn arm(
        needs_rebuild: &'a AtomicBool,
        insert_number: &'a InsertNumber,
        event_id: EventId,
    ) -> Self {
        Self {
            needs_rebuild,
            insert_number,
            event_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingDelta<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.needs_rebuild.store(true, Ordering::SeqCst);
            error!(
                event_id = %self.event_id,
                insert_number = %self.insert_number,
                "commit abandoned after ledger append; rebuild required"
            );
        }
    }
}

/// Records inward/outward movements and keeps the running totals in step with them.
///
/// Generic over the two stores so tests can swap in in-memory or fault-injecting
/// implementations; the application wires `Arc<dyn ..>` handles.
#[derive(Debug)]
pub struct InventoryService<L, A> {
    ledger: L,
    aggregate: A,
    locks: KeyedLocks<InsertNumber>,
    gate: RwLock<()>,
    needs_rebuild: AtomicBool,
}

impl<L, A> InventoryService<L, A> {
    pub fn new(ledger: L, aggregate: A) -> Self {
        Self {
            ledger,
            aggregate,
            locks: KeyedLocks::new(),
            gate: RwLock::new(()),
            needs_rebuild: AtomicBool::new(false),
        }
    }

    /// True once a commit has left the aggregate behind the ledger (or a rebuild failed
    /// part-way), until the next successful rebuild.
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild.load(Ordering::SeqCst)
    }
}

impl<L, A> InventoryService<L, A>
where
    L: LedgerStore,
    A: AggregateStore,
{
    /// Record received stock: `+quantity` on the insert's total.
    #[instrument(skip(self, command), fields(insert_number = %command.insert_number), err)]
    pub async fn record_inward(
        &self,
        command: RecordInward,
    ) -> Result<Committed<InwardEvent>, InventoryError> {
        let event = command.validate(Utc::now())?;
        let insert_number = event.insert_number().clone();
        let delta = event.delta();

        let _gate = self.gate.read().await;
        let _key = self.locks.lock(insert_number.clone()).await;

        let recorded = self.ledger.append_inward(event).await?;
        let total = self
            .apply_committed(&insert_number, delta, recorded.event_id())
            .await?;

        info!(
            event_id = %recorded.event_id(),
            sequence = recorded.sequence_number(),
            total,
            "inward movement recorded"
        );
        Ok(Committed {
            event: recorded,
            total,
        })
    }

    /// Record one consumed insert: `-1` on the insert's total.
    #[instrument(skip(self, command), fields(insert_number = %command.insert_number), err)]
    pub async fn record_outward(
        &self,
        command: RecordOutward,
    ) -> Result<Committed<OutwardEvent>, InventoryError> {
        let event = command.validate(Utc::now())?;
        let insert_number = event.insert_number().clone();
        let delta = event.delta();

        let _gate = self.gate.read().await;
        let _key = self.locks.lock(insert_number.clone()).await;

        let recorded = self.ledger.append_outward(event).await?;
        let total = self
            .apply_committed(&insert_number, delta, recorded.event_id())
            .await?;

        if total < 0 {
            warn!(total, "insert stock is negative");
        }
        info!(
            event_id = %recorded.event_id(),
            sequence = recorded.sequence_number(),
            total,
            "outward movement recorded"
        );
        Ok(Committed {
            event: recorded,
            total,
        })
    }

    // Called in the same poll that observed the append, so no cancellation point
    // separates the ledger write from arming the guard.
    async fn apply_committed(
        &self,
        insert_number: &InsertNumber,
        delta: i64,
        event_id: EventId,
    ) -> Result<i64, InventoryError> {
        let pending = PendingDelta::arm(&self.needs_rebuild, insert_number, event_id);
        let result = self.aggregate.apply_delta(insert_number, delta).await;
        pending.disarm();

        match result {
            Ok(total) => Ok(total),
            Err(source) => {
                self.needs_rebuild.store(true, Ordering::SeqCst);
                error!(
                    %event_id,
                    %insert_number,
                    error = %source,
                    "aggregate update failed after ledger append; rebuild required"
                );
                Err(InventoryError::AggregateDiverged { event_id, source })
            }
        }
    }

    /// Every aggregate entry, sorted by insert number.
    pub async fn dashboard(&self) -> Result<Vec<AggregateEntry>, InventoryError> {
        let _gate = self.gate.read().await;
        Ok(self.sorted_entries().await?)
    }

    /// Current total for one insert number (0 if never referenced).
    pub async fn stock(&self, insert_number: &InsertNumber) -> Result<i64, InventoryError> {
        let _gate = self.gate.read().await;
        Ok(self.aggregate.get(insert_number).await?)
    }

    pub async fn inward_history(&self) -> Result<Vec<Recorded<InwardEvent>>, InventoryError> {
        let _gate = self.gate.read().await;
        Ok(self.ledger.list_inward().await?)
    }

    pub async fn outward_history(&self) -> Result<Vec<Recorded<OutwardEvent>>, InventoryError> {
        let _gate = self.gate.read().await;
        Ok(self.ledger.list_outward().await?)
    }

    /// Discard the aggregate and recompute it from the ledger.
    ///
    /// Replays the inward stream, then the outward stream, each in sequence order,
    /// through the same `apply_delta` path commits use. Clears `needs_rebuild` on
    /// success; a failure part-way leaves it raised.
    #[instrument(skip(self), err)]
    pub async fn rebuild_aggregate(&self) -> Result<Vec<AggregateEntry>, InventoryError> {
        let _gate = self.gate.write().await;

        let inward = self.ledger.list_inward().await?;
        let outward = self.ledger.list_outward().await?;

        self.needs_rebuild.store(true, Ordering::SeqCst);
        self.aggregate.clear().await?;
        for recorded in &inward {
            let event = recorded.payload();
            self.aggregate
                .apply_delta(event.insert_number(), event.delta())
                .await?;
        }
        for recorded in &outward {
            let event = recorded.payload();
            self.aggregate
                .apply_delta(event.insert_number(), event.delta())
                .await?;
        }
        self.needs_rebuild.store(false, Ordering::SeqCst);

        let entries = self.sorted_entries().await?;
        info!(
            inward_events = inward.len(),
            outward_events = outward.len(),
            inserts = entries.len(),
            "aggregate rebuilt from ledger"
        );
        Ok(entries)
    }

    /// Replay the ledger in memory and compare it with the stored totals. Read-only.
    #[instrument(skip(self), err)]
    pub async fn check_consistency(&self) -> Result<ConsistencyReport, InventoryError> {
        // Exclusive so a commit between the ledger read and the aggregate read cannot
        // show up as drift.
        let _gate = self.gate.write().await;

        let inward = self.ledger.list_inward().await?;
        let outward = self.ledger.list_outward().await?;
        let stored = self.aggregate.list_all().await?;

        let drift = StockTotals::from_ledger(&inward, &outward).diff(&stored);
        if !drift.is_empty() {
            warn!(drifting = drift.len(), "aggregate disagrees with ledger");
        }
        Ok(ConsistencyReport {
            inward_events: inward.len(),
            outward_events: outward.len(),
            drift,
        })
    }

    async fn sorted_entries(&self) -> Result<Vec<AggregateEntry>, StoreError> {
        let mut entries = self.aggregate.list_all().await?;
        entries.sort_by(|a, b| a.insert_number.cmp(&b.insert_number));
        Ok(entries)
    }
}
