//! Keyed running totals per insert number.
//!
//! The aggregate is a cache of the ledger: every total can be recomputed by replaying
//! the movement streams, and `clear` exists only so that replay can start from empty.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryAggregateStore;
pub use r#trait::AggregateStore;
pub use sqlite::SqliteAggregateStore;
