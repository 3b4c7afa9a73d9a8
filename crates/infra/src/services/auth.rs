//! Registration, login and password change on top of a [`CredentialStore`].
//!
//! Argon2 is CPU-heavy, so hashing and verification run on tokio's blocking pool.
//! Registration and password change for one username are serialized by a per-key lock.
//! An unknown username is verified against a fixed hash so it costs the same as a wrong password.

use thiserror::Error;
use tracing::{info, instrument, warn};

use toolcrib_auth::{PasswordError, PasswordHash, User, hash_password, verify_password};
use toolcrib_core::Username;

use crate::credentials::CredentialStore;
use crate::error::StoreError;
use crate::locks::KeyedLocks;

/// Argon2id PHC string with the default parameters; no password verifies against it.
const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZBaT+aYIuD0AOId0qv/afQ$OxdSJ2nUg4o4zmfemBEoGBwIMbqa+huXUO5yrKABQi8";

/// Authentication failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username '{0}' already exists")]
    AlreadyExists(String),

    /// Unknown user or wrong password; which one is not disclosed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Hashing(#[from] PasswordError),
}

#[derive(Debug)]
pub struct AuthService<C> {
    credentials: C,
    locks: KeyedLocks<Username>,
}

impl<C> AuthService<C>
where
    C: CredentialStore,
{
    pub fn new(credentials: C) -> Self {
        Self {
            credentials,
            locks: KeyedLocks::new(),
        }
    }

    /// Create a user. Fails with `AlreadyExists` if the exact username is taken; the
    /// existing record is left untouched.
    #[instrument(skip(self, password), err)]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = Username::new(username).map_err(|e| AuthError::Validation(e.to_string()))?;
        require_password(password)?;

        let _key = self.locks.lock(username.clone()).await;
        if self.credentials.lookup(&username).await?.is_some() {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        let password = password.to_owned();
        let password_hash = blocking(move || hash_password(&password)).await?;
        if !self
            .credentials
            .insert_if_absent(User::new(username.clone(), password_hash))
            .await?
        {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        info!(%username, "user registered");
        Ok(())
    }

    /// True iff the user exists and the password verifies.
    #[instrument(skip(self, password), err)]
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let Ok(username) = Username::new(username) else {
            return Ok(false);
        };
        let Some(user) = self.credentials.lookup(&username).await? else {
            self.verify_unknown(password).await;
            warn!(%username, "login for unknown user");
            return Ok(false);
        };

        let verified = self.verify(password, user.password_hash).await?;
        if !verified {
            warn!(%username, "login with wrong password");
        }
        Ok(verified)
    }

    /// Replace the password after verifying the current one.
    #[instrument(skip(self, current, new), err)]
    pub async fn change_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let username = Username::new(username).map_err(|_| AuthError::InvalidCredentials)?;
        require_password(new)?;

        let _key = self.locks.lock(username.clone()).await;
        let Some(user) = self.credentials.lookup(&username).await? else {
            self.verify_unknown(current).await;
            warn!(%username, "password change for unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        if !self.verify(current, user.password_hash).await? {
            warn!(%username, "password change with wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let new = new.to_owned();
        let password_hash = blocking(move || hash_password(&new)).await?;
        if !self.credentials.update_hash(&username, password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        info!(%username, "password changed");
        Ok(())
    }

    pub async fn lookup(&self, username: &Username) -> Result<Option<User>, AuthError> {
        Ok(self.credentials.lookup(username).await?)
    }

    async fn verify(&self, password: &str, hash: PasswordHash) -> Result<bool, AuthError> {
        let password = password.to_owned();
        match blocking(move || verify_password(&password, &hash)).await {
            Err(AuthError::Hashing(PasswordError::InvalidHash)) => Err(AuthError::Storage(
                StoreError::Corrupt("stored password hash is not a PHC string".to_string()),
            )),
            other => other,
        }
    }

    async fn verify_unknown(&self, password: &str) {
        let hash = PasswordHash::from_phc(UNKNOWN_USER_HASH.to_string());
        let _ = self.verify(password, hash).await;
    }
}

fn require_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::Validation("password cannot be empty".to_string()));
    }
    Ok(())
}

async fn blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PasswordError::Hash(format!("hashing task failed: {e}")))?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::InMemoryCredentialStore;

    fn service() -> AuthService<InMemoryCredentialStore> {
        AuthService::new(InMemoryCredentialStore::new())
    }

    fn name(n: &str) -> Username {
        Username::new(n).unwrap()
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = service();
        auth.register("alice", "pw1").await.unwrap();

        assert!(auth.login("alice", "pw1").await.unwrap());
        assert!(!auth.login("alice", "nope").await.unwrap());
        assert!(!auth.login("Alice", "pw1").await.unwrap());
        assert!(!auth.login("", "pw1").await.unwrap());

        let stored = auth.lookup(&name("alice")).await.unwrap().unwrap();
        assert!(stored.password_hash.as_str().starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_the_original_hash() {
        let auth = service();
        auth.register("alice", "first").await.unwrap();
        let before = auth.lookup(&name("alice")).await.unwrap().unwrap();

        let err = auth.register("alice", "second").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(ref u) if u == "alice"));

        let after = auth.lookup(&name("alice")).await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
        assert!(auth.login("alice", "first").await.unwrap());
    }

    #[tokio::test]
    async fn wrong_current_password_keeps_the_old_one() {
        let auth = service();
        auth.register("bob", "old").await.unwrap();

        let err = auth.change_password("bob", "guess", "new").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(auth.login("bob", "old").await.unwrap());

        auth.change_password("bob", "old", "new").await.unwrap();
        assert!(auth.login("bob", "new").await.unwrap());
        assert!(!auth.login("bob", "old").await.unwrap());
    }

    #[tokio::test]
    async fn change_password_for_unknown_user_is_invalid_credentials() {
        let auth = service();
        let err = auth.change_password("ghost", "a", "b").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn unknown_user_hash_parses_and_rejects() {
        let hash = PasswordHash::from_phc(UNKNOWN_USER_HASH.to_string());
        assert!(UNKNOWN_USER_HASH.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
        assert_eq!(verify_password("", &hash), Ok(false));
        assert_eq!(verify_password("password", &hash), Ok(false));
    }

    #[tokio::test]
    async fn unknown_user_login_costs_a_full_verification() {
        let auth = service();
        auth.register("alice", "pw").await.unwrap();

        let started = std::time::Instant::now();
        assert!(!auth.login("alice", "wrong").await.unwrap());
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        assert!(!auth.login("ghost", "pw").await.unwrap());
        let unknown = started.elapsed();

        // Same Argon2 parameters on both paths.
        assert!(unknown * 10 >= wrong_password, "{unknown:?} vs {wrong_password:?}");
    }

    #[tokio::test]
    async fn blank_inputs_are_validation_errors() {
        let auth = service();
        assert!(matches!(
            auth.register("  ", "pw").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.register("carol", "").await,
            Err(AuthError::Validation(_))
        ));
        assert!(auth.lookup(&name("carol")).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_registrations_admit_exactly_one() {
        let auth = std::sync::Arc::new(service());
        let mut tasks = Vec::new();
        for i in 0..4 {
            let auth = auth.clone();
            tasks.push(tokio::spawn(async move {
                auth.register("dave", &format!("pw{i}")).await
            }));
        }

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => created += 1,
                Err(AuthError::AlreadyExists(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn unparseable_stored_hash_is_reported_as_corruption() {
        let store = InMemoryCredentialStore::new();
        store
            .insert_if_absent(User::new(
                name("erin"),
                PasswordHash::from_phc("plaintext".to_string()),
            ))
            .await
            .unwrap();
        let auth = AuthService::new(store);

        let err = auth.login("erin", "plaintext").await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(StoreError::Corrupt(_))));
    }
}
