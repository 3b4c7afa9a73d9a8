//! SQLite-backed user table.

use sqlx::{Row, SqlitePool};
use tracing::instrument;

use toolcrib_auth::{PasswordHash, User};
use toolcrib_core::Username;

use super::r#trait::CredentialStore;
use crate::db::map_sqlx_error;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn lookup(&self, username: &Username) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT username, password_hash FROM users WHERE username = ?")
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("lookup_user", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row
            .try_get("username")
            .map_err(|e| map_sqlx_error("lookup_user", e))?;
        let stored_name = Username::new(raw)
            .map_err(|e| StoreError::Corrupt(format!("user row: {e}")))?;
        let hash: String = row
            .try_get("password_hash")
            .map_err(|e| map_sqlx_error("lookup_user", e))?;

        Ok(Some(User::new(stored_name, PasswordHash::from_phc(hash))))
    }

    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert_if_absent(&self, user: User) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash) VALUES (?, ?) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(user.username.as_str())
        .bind(user.password_hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, password_hash), fields(username = %username), err)]
    async fn update_hash(
        &self,
        username: &Username,
        password_hash: PasswordHash,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
            .bind(password_hash.as_str())
            .bind(username.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_hash", e))?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, init_schema};

    async fn store() -> SqliteCredentialStore {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        SqliteCredentialStore::new(pool)
    }

    fn user(name: &str, hash: &str) -> User {
        User::new(
            Username::new(name).unwrap(),
            PasswordHash::from_phc(hash.to_string()),
        )
    }

    #[tokio::test]
    async fn conflicting_insert_is_a_no_op() {
        let store = store().await;
        assert!(store.insert_if_absent(user("alice", "h1")).await.unwrap());
        assert!(!store.insert_if_absent(user("alice", "h2")).await.unwrap());
        assert!(store.insert_if_absent(user("Alice", "h3")).await.unwrap());

        let alice = store
            .lookup(&Username::new("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.password_hash.as_str(), "h1");
    }

    #[tokio::test]
    async fn update_hash_reports_missing_users() {
        let store = store().await;
        let bob = Username::new("bob").unwrap();
        let hash = PasswordHash::from_phc("h2".to_string());
        assert!(!store.update_hash(&bob, hash.clone()).await.unwrap());

        store.insert_if_absent(user("bob", "h1")).await.unwrap();
        assert!(store.update_hash(&bob, hash).await.unwrap());
        let stored = store.lookup(&bob).await.unwrap().unwrap();
        assert_eq!(stored.password_hash.as_str(), "h2");
    }
}
