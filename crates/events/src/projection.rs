use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// Read models are **disposable**: they can be dropped and rebuilt from the ledger at
/// any time. The ledger is the source of truth; a projection is an optimized view.
///
/// Projections are pure event consumers; persistence is outside this crate.
pub trait Projection {
    type Ev: Event;

    /// Apply a single recorded event, updating the read model.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);

    /// Apply every envelope in iteration order.
    fn replay<'a, I>(&mut self, envelopes: I)
    where
        I: IntoIterator<Item = &'a EventEnvelope<Self::Ev>>,
        Self::Ev: 'a,
    {
        for envelope in envelopes {
            self.apply(envelope);
        }
    }
}
