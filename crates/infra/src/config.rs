//! Application configuration management.
//!
//! Sources, later ones winning:
//!
//! 1. `config/default.{toml,..}` (optional)
//! 2. `config/{RUN_MODE}` (optional, `RUN_MODE` defaults to `development`)
//! 3. `TOOLCRIB_*` environment variables, nested with `__`
//!    (e.g. `TOOLCRIB_STORAGE__DATABASE_URL`)
//!
//! A `.env` file in the working directory is loaded into the environment first.

use serde::Deserialize;

use toolcrib_observability::LogFormat;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Which store implementations back the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; everything is lost on exit.
    Memory,
    #[default]
    Sqlite,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// SQLite connection URL. The file is created if missing.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite://toolcrib.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Inventory service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Compare the aggregate against the ledger at startup and rebuild on drift.
    #[serde(default = "default_reconcile_on_startup")]
    pub reconcile_on_startup: bool,
}

fn default_reconcile_on_startup() -> bool {
    true
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            reconcile_on_startup: default_reconcile_on_startup(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from `.env`, config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a value has the wrong type.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::from_sources(&run_mode, environment())
    }

    fn from_sources(
        run_mode: &str,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("TOOLCRIB")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
