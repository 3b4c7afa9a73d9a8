//! Running totals per insert, derived by replaying the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use toolcrib_events::{EventEnvelope, Projection};

use crate::{InsertNumber, InwardEvent, LedgerEvent, OutwardEvent};

/// Current quantity on hand for one insert. May be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub insert_number: InsertNumber,
    pub total_quantity: i64,
}

/// An insert whose stored total disagrees with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drift {
    pub insert_number: InsertNumber,
    /// Total obtained by replaying the ledger.
    pub expected: i64,
    /// Total found in the aggregate store (`None` when the entry is missing).
    pub stored: Option<i64>,
}

/// In-memory totals projection over both ledger streams.
///
/// This is the reference computation for the aggregate store: replaying the full
/// ledger through it yields the totals the store must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockTotals {
    totals: BTreeMap<InsertNumber, i64>,
}

impl StockTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay the inward stream, then the outward stream, each in sequence order.
    pub fn from_ledger(
        inward: &[EventEnvelope<InwardEvent>],
        outward: &[EventEnvelope<OutwardEvent>],
    ) -> Self {
        let mut totals = Self::new();
        for env in inward {
            totals.add(env.payload().insert_number(), env.payload().delta());
        }
        for env in outward {
            totals.add(env.payload().insert_number(), env.payload().delta());
        }
        totals
    }

    // Saturates at the i64 bounds instead of wrapping or panicking.
    fn add(&mut self, insert_number: &InsertNumber, delta: i64) {
        let total = self.totals.entry(insert_number.clone()).or_insert(0);
        *total = total.saturating_add(delta);
    }

    /// Total for an insert; 0 if it never appeared.
    pub fn get(&self, insert_number: &InsertNumber) -> i64 {
        self.totals.get(insert_number).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Entries sorted by insert number.
    pub fn entries(&self) -> Vec<AggregateEntry> {
        self.totals
            .iter()
            .map(|(insert_number, total)| AggregateEntry {
                insert_number: insert_number.clone(),
                total_quantity: *total,
            })
            .collect()
    }

    /// Compare against a stored snapshot and report every disagreement.
    pub fn diff(&self, stored: &[AggregateEntry]) -> Vec<Drift> {
        let stored: BTreeMap<&InsertNumber, i64> = stored
            .iter()
            .map(|e| (&e.insert_number, e.total_quantity))
            .collect();

        let mut drift: Vec<Drift> = self
            .totals
            .iter()
            .filter(|(n, expected)| stored.get(n) != Some(*expected))
            .map(|(n, expected)| Drift {
                insert_number: n.clone(),
                expected: *expected,
                stored: stored.get(n).copied(),
            })
            .collect();

        // Entries the ledger knows nothing about.
        drift.extend(
            stored
                .iter()
                .filter(|(n, _)| !self.totals.contains_key(**n))
                .map(|(n, total)| Drift {
                    insert_number: (*n).clone(),
                    expected: 0,
                    stored: Some(*total),
                }),
        );
        drift.sort_by(|a, b| a.insert_number.cmp(&b.insert_number));
        drift
    }
}

impl Projection for StockTotals {
    type Ev = LedgerEvent;

    fn apply(&mut self, envelope: &EventEnvelope<LedgerEvent>) {
        let event = envelope.payload();
        self.add(event.insert_number(), event.delta());
    }
}
