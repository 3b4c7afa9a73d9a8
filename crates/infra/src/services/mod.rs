//! Application services: orchestration over the store traits, no IO of their own.

pub mod auth;
pub mod inventory;

pub use auth::{AuthError, AuthService};
pub use inventory::{Committed, ConsistencyReport, InventoryError, InventoryService};
