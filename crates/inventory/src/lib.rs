//! Insert inventory domain module.
//!
//! Business rules for inward/outward movements of tooling inserts and the running
//! total derived from them, implemented as deterministic domain logic (no IO, no
//! HTTP, no storage).

pub mod insert;
pub mod movement;
pub mod op_code;
pub mod totals;

pub use insert::{InsertNumber, Quantity, ToolNumber};
pub use movement::{
    InwardEvent, LedgerEvent, OUTWARD_QUANTITY, OutwardEvent, RecordInward, RecordOutward,
};
pub use op_code::OpCode;
pub use totals::{AggregateEntry, Drift, StockTotals};

/// A ledger event together with its stream position and id.
pub type Recorded<E> = toolcrib_events::EventEnvelope<E>;
