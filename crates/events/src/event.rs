use chrono::{DateTime, Utc};

/// A fact recorded in an append-only ledger stream.
///
/// Implementors are immutable values; once appended they are never rewritten.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Name of the ledger stream this event belongs to (e.g. "inward").
    fn stream(&self) -> &'static str;

    /// Stable event type identifier (e.g. "inventory.inward.recorded").
    fn event_type(&self) -> &'static str;

    /// Business time at which the movement happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}
