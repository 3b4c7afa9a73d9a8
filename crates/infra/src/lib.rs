//! Infrastructure layer: stores, services, configuration and startup wiring.
//!
//! Store traits live next to their in-memory and SQLite implementations; the
//! services only ever see the traits.

pub mod aggregate;
pub mod app;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod services;

mod integration_tests;
#[cfg(test)]
mod test_support;

pub use app::{App, AppError};
pub use config::AppConfig;
pub use error::StoreError;
pub use services::{AuthError, Committed, ConsistencyReport, InventoryError};
