//! # Store Database
//!
//! Opens the SQLite store and hands out repositories and units of work.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig ──► Database::new ──► migrate                                 │
//! │                    │                                                    │
//! │                    ├──► products() / carts() / orders()   pooled reads  │
//! │                    │                                                    │
//! │                    └──► begin() ──► UnitOfWork            stock, orders │
//! │                                        └─ rolled back unless committed  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File stores use WAL with one writer at a time. A writer still locked out
//! after `busy_timeout` surfaces as [`DbError::Conflict`].
//!
//! A `:memory:` store exists only inside its connection, so it is always
//! opened with exactly one pooled connection that never expires. Units of
//! work against it run strictly one after another.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::cart::CartRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::unit_of_work::UnitOfWork;

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    Memory,
}

impl Storage {
    fn from_path(path: &Path) -> Self {
        if path.as_os_str() == ":memory:" {
            Storage::Memory
        } else {
            Storage::File(path.to_path_buf())
        }
    }
}

/// How to open the store.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/tienda/tienda.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,

    /// Ignored for [`Storage::Memory`], which always uses one connection.
    pub max_connections: u32,

    /// Wait for a free pooled connection before failing with `PoolExhausted`.
    pub acquire_timeout: Duration,

    /// SQLite lock wait before a write reports BUSY.
    pub busy_timeout: Duration,

    pub migrate_on_open: bool,
}

impl DbConfig {
    /// `":memory:"` selects an in-memory store; anything else is a file that
    /// is created on first open.
    pub fn new(path: impl AsRef<Path>) -> Self {
        DbConfig {
            storage: Storage::from_path(path.as_ref()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            migrate_on_open: true,
        }
    }

    /// Fresh, migrated in-memory store. Used throughout the test suites.
    pub fn in_memory() -> Self {
        DbConfig::new(":memory:").acquire_timeout(Duration::from_secs(5))
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn migrate_on_open(mut self, migrate: bool) -> Self {
        self.migrate_on_open = migrate;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage == Storage::Memory
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        match self.storage {
            Storage::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            Storage::File(_) => options
                .max_connections(self.max_connections.max(1))
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(30 * 60)),
        }
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.storage {
            Storage::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
        };

        // Off by default in SQLite
        Ok(options.foreign_keys(true).busy_timeout(self.busy_timeout))
    }
}

/// Handle to the store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        match &config.storage {
            Storage::Memory => info!("Opening in-memory store"),
            Storage::File(path) => info!(path = %path.display(), "Opening store"),
        }

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.migrate_on_open {
            migrations::run_migrations(&db.pool).await?;
            info!("Schema up to date");
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// One connection, one open transaction. Dropped without
    /// [`UnitOfWork::commit`] it rolls back.
    pub async fn begin(&self) -> DbResult<UnitOfWork> {
        UnitOfWork::begin(&self.pool).await
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing store");
        self.pool.close().await;
    }

    /// Round trip to SQLite; false once the pool is closed or broken.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert!(total > 0);
        assert_eq!(total, applied);
    }

    #[test]
    fn test_storage_selection() {
        let config = DbConfig::new("/tmp/tienda.db").max_connections(8);
        assert_eq!(config.storage, Storage::File(PathBuf::from("/tmp/tienda.db")));
        assert_eq!(config.max_connections, 8);
        assert!(!config.is_in_memory());

        assert!(DbConfig::new(":memory:").is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[tokio::test]
    async fn test_memory_store_ignores_pool_size() {
        let db = Database::new(DbConfig::in_memory().max_connections(4)).await.unwrap();
        assert_eq!(db.pool().options().get_max_connections(), 1);
    }

    #[tokio::test]
    async fn test_closed_store_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
