//! `toolcrib-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod username;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::EventId;
pub use username::Username;
pub use value_object::ValueObject;
