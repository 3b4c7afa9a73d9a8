//! Storage error shared by every store in this crate.

use thiserror::Error;

/// Store operation error.
///
/// These are **infrastructure errors** (IO, database, corrupt rows) as opposed to
/// domain errors (validation, credentials). None of them is retried internally.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed to read or write (IO, pool, database). Safe to retry.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record no longer satisfies the domain rules it was written under.
    #[error("corrupt stored record: {0}")]
    Corrupt(String),

    /// A running total left the representable range.
    #[error("total overflow for insert '{0}'")]
    Overflow(String),

    /// An in-memory store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Backend(_))
    }
}
