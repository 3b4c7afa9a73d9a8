use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use toolcrib_auth::{PasswordHash, User};
use toolcrib_core::Username;

use super::r#trait::CredentialStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<Username, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, username: &Username) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(users.get(username).cloned())
    }

    async fn insert_if_absent(&self, user: User) -> Result<bool, StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;
        match users.entry(user.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(true)
            }
        }
    }

    async fn update_hash(
        &self,
        username: &Username,
        password_hash: PasswordHash,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;
        match users.get_mut(username) {
            Some(user) => {
                user.password_hash = password_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, hash: &str) -> User {
        User::new(
            Username::new(name).unwrap(),
            PasswordHash::from_phc(hash.to_string()),
        )
    }

    #[tokio::test]
    async fn second_insert_keeps_the_first_record() {
        let store = InMemoryCredentialStore::new();
        assert!(store.insert_if_absent(user("alice", "h1")).await.unwrap());
        assert!(!store.insert_if_absent(user("alice", "h2")).await.unwrap());

        let stored = store
            .lookup(&Username::new("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.password_hash.as_str(), "h1");
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = InMemoryCredentialStore::new();
        store.insert_if_absent(user("alice", "h1")).await.unwrap();
        let other = Username::new("Alice").unwrap();
        assert!(store.lookup(&other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_hash_requires_an_existing_user() {
        let store = InMemoryCredentialStore::new();
        let alice = Username::new("alice").unwrap();
        let new_hash = PasswordHash::from_phc("h2".to_string());
        assert!(!store.update_hash(&alice, new_hash.clone()).await.unwrap());

        store.insert_if_absent(user("alice", "h1")).await.unwrap();
        assert!(store.update_hash(&alice, new_hash).await.unwrap());
        let stored = store.lookup(&alice).await.unwrap().unwrap();
        assert_eq!(stored.password_hash.as_str(), "h2");
    }
}
