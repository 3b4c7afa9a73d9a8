//! `toolcrib-auth` — credential primitives.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows what a user
//! record looks like and how to hash and verify passwords, nothing more.

pub mod password;
pub mod user;

pub use password::{PasswordError, hash_password, verify_password};
pub use user::{PasswordHash, User};
