//! Append-only movement ledger.
//!
//! Two streams (inward, outward), each immutable once written and read back in
//! insertion order. The ledger is the source of truth the aggregate is rebuilt from.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::LedgerStore;
pub use sqlite::SqliteLedgerStore;
