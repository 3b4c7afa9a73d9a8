//! Integration tests for the full movement pipeline over SQLite.
//!
//! Tests: App → InventoryService → LedgerStore + AggregateStore → SQLite
//!
//! Verifies:
//! - Incremental totals and a rebuild from the ledger agree
//! - Ledger and credentials survive reopening the database
//! - A drifted aggregate is repaired at startup

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use toolcrib_core::EventId;
    use toolcrib_inventory::{AggregateEntry, InsertNumber, OpCode};

    use crate::aggregate::SqliteAggregateStore;
    use crate::app::App;
    use crate::config::{AppConfig, StorageBackend, StorageConfig};
    use crate::credentials::SqliteCredentialStore;
    use crate::db;
    use crate::ledger::SqliteLedgerStore;
    use crate::services::{AuthError, InventoryError};

    async fn sqlite_app() -> App {
        let pool = db::connect_in_memory().await.unwrap();
        db::init_schema(&pool).await.unwrap();
        App::from_stores(
            Arc::new(SqliteLedgerStore::new(pool.clone())),
            Arc::new(SqliteAggregateStore::new(pool.clone())),
            Arc::new(SqliteCredentialStore::new(pool)),
        )
    }

    /// A database file under the temp dir, removed (with its WAL files) on drop.
    struct TempDb {
        path: PathBuf,
    }

    impl TempDb {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!("toolcrib-{}.db", EventId::new()));
            Self { path }
        }

        fn config(&self) -> AppConfig {
            let mut config = AppConfig::default();
            config.storage = StorageConfig {
                backend: StorageBackend::Sqlite,
                database_url: format!("sqlite://{}", self.path.display()),
                max_connections: 2,
            };
            config
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    fn entry(n: &str, total: i64) -> AggregateEntry {
        AggregateEntry {
            insert_number: InsertNumber::new(n).unwrap(),
            total_quantity: total,
        }
    }

    #[tokio::test]
    async fn movement_scenario_over_sqlite() {
        let app = sqlite_app().await;

        app.register("alice", "pw").await.unwrap();
        assert!(app.login("alice", "pw").await.unwrap());

        assert_eq!(app.record_inward("alice", "A1", 10).await.unwrap().total, 10);
        assert_eq!(
            app.record_outward("alice", "A1", "OP10", "T-100")
                .await
                .unwrap()
                .total,
            9
        );
        app.record_outward("alice", "B2", "op100", "T-7").await.unwrap();

        let incremental = app.dashboard().await.unwrap();
        assert_eq!(incremental, vec![entry("A1", 9), entry("B2", -1)]);

        let rebuilt = app.rebuild_aggregate().await.unwrap();
        assert_eq!(rebuilt, incremental);

        let outward = app.outward_history().await.unwrap();
        assert_eq!(outward.len(), 2);
        assert_eq!(outward[1].sequence_number(), 2);
        assert_eq!(outward[1].payload().op_code(), OpCode::Op100);
        assert_eq!(outward[1].payload().tool_number().as_str(), "T-7");

        let inward = app.inward_history().await.unwrap();
        assert_eq!(inward[0].payload().user().as_str(), "alice");
        assert_eq!(inward[0].payload().quantity().get(), 10);
    }

    #[tokio::test]
    async fn rejected_requests_leave_sqlite_untouched() {
        let app = sqlite_app().await;
        app.record_inward("alice", "A1", 3).await.unwrap();

        assert!(matches!(
            app.record_outward("alice", "A1", "OP99", "T1").await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            app.record_outward("alice", "A1", "OP10", "  ").await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            app.record_inward("alice", "A1", 0).await,
            Err(InventoryError::Validation(_))
        ));

        assert_eq!(app.inward_history().await.unwrap().len(), 1);
        assert!(app.outward_history().await.unwrap().is_empty());
        assert_eq!(app.stock("A1").await.unwrap(), 3);
        assert!(app.check_consistency().await.unwrap().is_consistent());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sqlite_commits_net_out() {
        let app = Arc::new(sqlite_app().await);
        let mut tasks = Vec::new();
        for i in 0..24 {
            let app = app.clone();
            tasks.push(tokio::spawn(async move {
                match i % 3 {
                    0 => app
                        .record_outward("bob", "X1", "OP60", "T9")
                        .await
                        .map(|c| c.total),
                    _ => app.record_inward("bob", "X1", 2).await.map(|c| c.total),
                }
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(app.stock("X1").await.unwrap(), 16 * 2 - 8);
        let report = app.check_consistency().await.unwrap();
        assert_eq!(report.inward_events, 16);
        assert_eq!(report.outward_events, 8);
        assert!(report.is_consistent());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let db = TempDb::new();
        let config = db.config();

        {
            let app = App::open(&config).await.unwrap();
            app.register("carol", "secret").await.unwrap();
            app.record_inward("carol", "Q5", 4).await.unwrap();
            app.record_outward("carol", "Q5", "OP20", "T2").await.unwrap();
        }

        let app = App::open(&config).await.unwrap();
        assert!(app.login("carol", "secret").await.unwrap());
        assert!(matches!(
            app.register("carol", "other").await,
            Err(AuthError::AlreadyExists(_))
        ));
        assert_eq!(app.dashboard().await.unwrap(), vec![entry("Q5", 3)]);

        let committed = app.record_inward("carol", "Q5", 1).await.unwrap();
        assert_eq!(committed.event.sequence_number(), 2);
        assert_eq!(committed.total, 4);
    }

    #[tokio::test]
    async fn startup_reconcile_repairs_a_drifted_aggregate() {
        let db = TempDb::new();
        let config = db.config();

        {
            let app = App::open(&config).await.unwrap();
            app.record_inward("dan", "R1", 7).await.unwrap();
            app.record_outward("dan", "R1", "OP70", "T3").await.unwrap();
        }

        // Simulate a crash between ledger append and aggregate update.
        {
            let pool = db::connect(&config.storage).await.unwrap();
            sqlx::query("UPDATE aggregate_totals SET total_quantity = 7 WHERE insert_number = 'R1'")
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query("INSERT INTO aggregate_totals (insert_number, total_quantity) VALUES ('GHOST', 2)")
                .execute(&pool)
                .await
                .unwrap();
            pool.close().await;
        }

        let mut without_reconcile = config.clone();
        without_reconcile.inventory.reconcile_on_startup = false;
        {
            let app = App::open(&without_reconcile).await.unwrap();
            let report = app.check_consistency().await.unwrap();
            assert_eq!(report.drift.len(), 2);
        }

        let app = App::open(&config).await.unwrap();
        assert_eq!(app.dashboard().await.unwrap(), vec![entry("R1", 6)]);
        assert!(!app.needs_rebuild());
    }

    #[tokio::test]
    async fn memory_backend_from_config() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;

        let app = App::open(&config).await.unwrap();
        app.record_inward("erin", "M1", 2).await.unwrap();
        assert_eq!(app.stock("M1").await.unwrap(), 2);
        assert_eq!(app.stock("never-seen").await.unwrap(), 0);
        assert!(matches!(
            app.stock("   ").await,
            Err(InventoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn op_codes_are_listed_in_order() {
        let app = App::in_memory();
        let names: Vec<&str> = app.op_codes().iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec!["OP10", "OP20", "OP30", "OP40", "OP50", "OP60", "OP70", "OP80", "OP90", "OP100"]
        );
    }
}
