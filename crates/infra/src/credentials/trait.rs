use std::sync::Arc;

use toolcrib_auth::{PasswordHash, User};
use toolcrib_core::Username;

use crate::error::StoreError;

/// Keyed store of users.
///
/// Users are never deleted. Hashing and verification live in the auth service; the
/// store only persists what it is given.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive lookup.
    async fn lookup(&self, username: &Username) -> Result<Option<User>, StoreError>;

    /// Persist `user` unless the username is already taken. Returns `false` (and leaves
    /// the existing record untouched) on conflict.
    async fn insert_if_absent(&self, user: User) -> Result<bool, StoreError>;

    /// Replace the stored hash. Returns `false` if the user does not exist.
    async fn update_hash(
        &self,
        username: &Username,
        password_hash: PasswordHash,
    ) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn lookup(&self, username: &Username) -> Result<Option<User>, StoreError> {
        (**self).lookup(username).await
    }

    async fn insert_if_absent(&self, user: User) -> Result<bool, StoreError> {
        (**self).insert_if_absent(user).await
    }

    async fn update_hash(
        &self,
        username: &Username,
        password_hash: PasswordHash,
    ) -> Result<bool, StoreError> {
        (**self).update_hash(username, password_hash).await
    }
}
