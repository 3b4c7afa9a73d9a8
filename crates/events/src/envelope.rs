use serde::{Deserialize, Serialize};

use toolcrib_core::EventId;

/// Envelope for an event that has been appended to a ledger stream.
///
/// This is what a store hands back from an append and from a listing.
///
/// Notes:
/// - `event_id` is unique across all streams.
/// - `sequence_number` is the 1-based position in the event's own stream and is
///   strictly increasing with no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: EventId,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: EventId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    /// Re-wrap the payload, keeping the stream metadata.
    pub fn map<F, T>(self, f: F) -> EventEnvelope<T>
    where
        F: FnOnce(E) -> T,
    {
        EventEnvelope {
            event_id: self.event_id,
            sequence_number: self.sequence_number,
            payload: f(self.payload),
        }
    }
}
