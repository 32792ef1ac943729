//! # Database Context
//!
//! Connection pool configuration plus the [`Database`] context that hands
//! out repositories.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Context                                   │
//! │                                                                         │
//! │  DbConfig::new(path) / DbConfig::from_env() / DbConfig::in_memory()     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations             │
//! │       │                                                                 │
//! │       ├── db.products()          ProductRepository                      │
//! │       ├── db.sales()             SaleRepository                         │
//! │       ├── db.suppliers()         GenericRepository<Supplier>            │
//! │       ├── db.customers()         GenericRepository<Customer>            │
//! │       ├── db.product_suppliers() ProductSupplierRepository              │
//! │       ├── db.repository::<T>()   GenericRepository<T>                   │
//! │       └── db.seed()              embedded demo catalogue                │
//! │                                                                         │
//! │  Every repository holds a clone of the same SqlitePool.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## SQLite Settings
//! - WAL journal for file databases (readers don't block the writer)
//! - `foreign_keys = ON` (SQLite defaults to OFF)

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::entity::Entity;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    GenericRepository, ProductRepository, ProductSupplierRepository, SaleRepository,
};
use crate::seed::{self, SeedData, SeedSummary};
use storefront_core::{Customer, Supplier};

/// Path that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Environment variable holding the database file path.
pub const ENV_DB_PATH: &str = "STOREFRONT_DB_PATH";

/// Environment variable holding the pool size.
pub const ENV_MAX_CONNECTIONS: &str = "STOREFRONT_DB_MAX_CONNECTIONS";

/// Environment variable toggling migrations on connect (`true`/`false`).
pub const ENV_RUN_MIGRATIONS: &str = "STOREFRONT_DB_RUN_MIGRATIONS";

/// Database file used when nothing is configured.
pub const DEFAULT_DB_PATH: &str = "./storefront.db";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/storefront.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or [`IN_MEMORY_PATH`].
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Every call yields a fresh, isolated database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    /// Loads configuration from `STOREFRONT_DB_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let mut config = if path == IN_MEMORY_PATH {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path)
        };

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            let max: u32 = raw
                .trim()
                .parse()
                .map_err(|_| DbError::invalid_config(ENV_MAX_CONNECTIONS, "expected a number"))?;
            if max == 0 {
                return Err(DbError::invalid_config(ENV_MAX_CONNECTIONS, "must be at least 1"));
            }
            // Each in-memory connection would be a separate database
            if !config.is_in_memory() {
                config = config.max_connections(max);
                config.min_connections = config.min_connections.min(max);
            }
        }

        if let Some(raw) = lookup(ENV_RUN_MIGRATIONS) {
            let run = raw
                .trim()
                .parse()
                .map_err(|_| DbError::invalid_config(ENV_RUN_MIGRATIONS, "expected true or false"))?;
            config = config.run_migrations(run);
        }

        Ok(config)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Memory)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        Ok(options.foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// The database context: owns the pool and hands out repositories.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Configures SQLite connection options (WAL, foreign keys)
    /// 2. Creates a connection pool
    /// 3. Runs migrations (if enabled in config)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Returns `(total_migrations, applied_migrations)`.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns a generic repository for any mapped entity.
    pub fn repository<T: Entity>(&self) -> GenericRepository<T> {
        GenericRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the sale repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the supplier repository.
    pub fn suppliers(&self) -> GenericRepository<Supplier> {
        self.repository()
    }

    /// Returns the customer repository.
    pub fn customers(&self) -> GenericRepository<Customer> {
        self.repository()
    }

    /// Returns the product/supplier link repository.
    pub fn product_suppliers(&self) -> ProductSupplierRepository {
        ProductSupplierRepository::new(self.pool.clone())
    }

    /// Applies the embedded demo catalogue. Safe to call repeatedly.
    pub async fn seed(&self) -> DbResult<SeedSummary> {
        let data = SeedData::embedded()?;
        seed::apply(&self.pool, &data).await
    }

    /// Closes the database connection pool.
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        assert_eq!(db.migration_status().await.unwrap(), (2, 2));
        db.close().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = DbConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.max_connections, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = DbConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, ":memory:"),
            (ENV_MAX_CONNECTIONS, "1"),
            (ENV_RUN_MIGRATIONS, "false"),
        ]))
        .unwrap();

        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_config_from_lookup_rejects_bad_values() {
        let err = DbConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "lots")])).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig { ref key, .. } if key == ENV_MAX_CONNECTIONS));

        let err = DbConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "0")])).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig { .. }));

        let err = DbConfig::from_lookup(lookup(&[(ENV_RUN_MIGRATIONS, "maybe")])).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig { .. }));
    }
}
