//! Persisted user records.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryCredentialStore;
pub use r#trait::CredentialStore;
pub use sqlite::SqliteCredentialStore;
