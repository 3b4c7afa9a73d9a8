//! Collaborator-facing entry point.
//!
//! `App` owns every store handle and the two services built on them. A web layer (or
//! the admin binary) creates one at startup and calls into it per request; nothing in
//! the workspace holds global state.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use toolcrib_auth::User;
use toolcrib_core::Username;
use toolcrib_inventory::{
    AggregateEntry, InsertNumber, InwardEvent, OpCode, OutwardEvent, Recorded, RecordInward,
    RecordOutward,
};

use crate::aggregate::{AggregateStore, InMemoryAggregateStore, SqliteAggregateStore};
use crate::config::{AppConfig, StorageBackend};
use crate::credentials::{CredentialStore, InMemoryCredentialStore, SqliteCredentialStore};
use crate::db;
use crate::error::StoreError;
use crate::ledger::{InMemoryLedgerStore, LedgerStore, SqliteLedgerStore};
use crate::services::{
    AuthError, AuthService, Committed, ConsistencyReport, InventoryError, InventoryService,
};

pub type SharedLedger = Arc<dyn LedgerStore>;
pub type SharedAggregate = Arc<dyn AggregateStore>;
pub type SharedCredentials = Arc<dyn CredentialStore>;

/// Startup failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

pub struct App {
    inventory: InventoryService<SharedLedger, SharedAggregate>,
    auth: AuthService<SharedCredentials>,
}

impl App {
    /// Open the configured backend, creating the database and schema if absent.
    ///
    /// With `inventory.reconcile_on_startup`, the aggregate is checked against the
    /// ledger and rebuilt if they disagree (e.g. after a crash between append and
    /// aggregate update).
    pub async fn open(config: &AppConfig) -> Result<Self, AppError> {
        let app = match config.storage.backend {
            StorageBackend::Memory => Self::in_memory(),
            StorageBackend::Sqlite => {
                let pool = db::connect(&config.storage).await?;
                db::init_schema(&pool).await?;
                Self::from_stores(
                    Arc::new(SqliteLedgerStore::new(pool.clone())),
                    Arc::new(SqliteAggregateStore::new(pool.clone())),
                    Arc::new(SqliteCredentialStore::new(pool)),
                )
            }
        };

        if config.inventory.reconcile_on_startup {
            app.reconcile().await?;
        }
        info!(backend = ?config.storage.backend, "toolcrib ready");
        Ok(app)
    }

    /// Process-local stores, for tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self::from_stores(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryAggregateStore::new()),
            Arc::new(InMemoryCredentialStore::new()),
        )
    }

    pub fn from_stores(
        ledger: SharedLedger,
        aggregate: SharedAggregate,
        credentials: SharedCredentials,
    ) -> Self {
        Self {
            inventory: InventoryService::new(ledger, aggregate),
            auth: AuthService::new(credentials),
        }
    }

    /// Rebuild the aggregate if it disagrees with the ledger. Returns the report taken
    /// before any repair.
    pub async fn reconcile(&self) -> Result<ConsistencyReport, InventoryError> {
        let report = self.inventory.check_consistency().await?;
        if !report.is_consistent() {
            warn!(
                drifting = report.drift.len(),
                "aggregate out of step with ledger, rebuilding"
            );
            self.inventory.rebuild_aggregate().await?;
        }
        Ok(report)
    }

    pub fn inventory(&self) -> &InventoryService<SharedLedger, SharedAggregate> {
        &self.inventory
    }

    pub fn auth(&self) -> &AuthService<SharedCredentials> {
        &self.auth
    }

    // ---- credentials ----

    pub async fn login(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        self.auth.login(username, password).await
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        self.auth.register(username, password).await
    }

    pub async fn change_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        self.auth.change_password(username, current, new).await
    }

    pub async fn lookup_user(&self, username: &Username) -> Result<Option<User>, AuthError> {
        self.auth.lookup(username).await
    }

    // ---- movements ----

    pub async fn record_inward(
        &self,
        user: &str,
        insert_number: &str,
        quantity: i64,
    ) -> Result<Committed<InwardEvent>, InventoryError> {
        self.inventory
            .record_inward(RecordInward {
                user: user.to_owned(),
                insert_number: insert_number.to_owned(),
                quantity,
            })
            .await
    }

    pub async fn record_outward(
        &self,
        user: &str,
        insert_number: &str,
        op_code: &str,
        tool_number: &str,
    ) -> Result<Committed<OutwardEvent>, InventoryError> {
        self.inventory
            .record_outward(RecordOutward {
                user: user.to_owned(),
                insert_number: insert_number.to_owned(),
                op_code: op_code.to_owned(),
                tool_number: tool_number.to_owned(),
            })
            .await
    }

    pub async fn dashboard(&self) -> Result<Vec<AggregateEntry>, InventoryError> {
        self.inventory.dashboard().await
    }

    pub async fn stock(&self, insert_number: &str) -> Result<i64, InventoryError> {
        let insert_number = InsertNumber::new(insert_number)?;
        self.inventory.stock(&insert_number).await
    }

    pub async fn inward_history(&self) -> Result<Vec<Recorded<InwardEvent>>, InventoryError> {
        self.inventory.inward_history().await
    }

    pub async fn outward_history(&self) -> Result<Vec<Recorded<OutwardEvent>>, InventoryError> {
        self.inventory.outward_history().await
    }

    pub async fn rebuild_aggregate(&self) -> Result<Vec<AggregateEntry>, InventoryError> {
        self.inventory.rebuild_aggregate().await
    }

    pub async fn check_consistency(&self) -> Result<ConsistencyReport, InventoryError> {
        self.inventory.check_consistency().await
    }

    pub fn needs_rebuild(&self) -> bool {
        self.inventory.needs_rebuild()
    }

    /// Operation codes accepted for outward movements, in display order.
    pub fn op_codes(&self) -> &'static [OpCode] {
        &OpCode::ALL
    }
}
