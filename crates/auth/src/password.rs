//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings with a random per-password salt.

use argon2::{
    Argon2,
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use crate::user::PasswordHash;

/// Errors that can occur during password operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    Hash(String),

    /// Verification failed for a reason other than a wrong password.
    #[error("failed to verify password: {0}")]
    Verify(String),

    /// Stored hash is not a parseable PHC string.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Hash a raw password using Argon2id with a fresh salt.
///
/// This is deliberately slow; async callers should run it on a blocking thread.
pub fn hash_password(password: &str) -> Result<PasswordHash, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| PasswordHash::from_phc(hash.to_string()))
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a raw password against a stored hash.
///
/// Returns `Ok(false)` for a wrong password and an error only when the hash itself
/// cannot be used.
pub fn verify_password(password: &str, hash: &PasswordHash) -> Result<bool, PasswordError> {
    let parsed = password_hash::PasswordHash::new(hash.as_str())
        .map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_phc_argon2id() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.as_str().starts_with("$argon2id$"));
        assert_ne!(hash.as_str(), "s3cret!");
    }

    #[test]
    fn verifies_only_the_right_password() {
        let hash = hash_password("right").unwrap();
        assert!(verify_password("right", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let a = hash_password("pw").unwrap();
        let b = hash_password("pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_is_an_error() {
        let bogus = PasswordHash::from_phc("plaintext".to_string());
        assert_eq!(verify_password("pw", &bogus), Err(PasswordError::InvalidHash));
    }
}
