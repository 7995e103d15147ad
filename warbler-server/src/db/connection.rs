use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::PathBuf;
use std::time::Duration;

use super::schema::{SCHEMA, TABLES};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Where a `DATABASE_URL` points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

/// Parse a `DATABASE_URL` value.
///
/// Accepts `sqlite://path`, `sqlite:path`, `sqlite::memory:`, `:memory:` and bare file
/// paths. Any other scheme (e.g. `postgresql://`) is rejected.
pub fn parse_database_url(url: &str) -> Result<DatabaseLocation> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }

    let rest = if let Some(rest) = trimmed.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("sqlite:") {
        rest
    } else if let Some((scheme, _)) = trimmed.split_once("://") {
        anyhow::bail!("Unsupported database URL scheme '{}'", scheme);
    } else {
        trimmed
    };

    if rest.is_empty() {
        anyhow::bail!("DATABASE_URL '{}' has no database path", trimmed);
    }

    if rest.eq_ignore_ascii_case(MEMORY_DB_PATH) {
        Ok(DatabaseLocation::Memory)
    } else {
        Ok(DatabaseLocation::File(PathBuf::from(rest)))
    }
}

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool from a `DATABASE_URL`
    pub fn new(url: &str) -> Result<Self> {
        let location = parse_database_url(url)?;
        let manager = Self::create_connection_manager(&location);
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on location
    ///
    /// In-memory databases get a uniquely named shared-cache URI so every pooled
    /// connection sees the same data.
    fn create_connection_manager(location: &DatabaseLocation) -> SqliteConnectionManager {
        let manager = match location {
            DatabaseLocation::Memory => {
                let uri = format!("file:warbler-{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
                SqliteConnectionManager::file(uri).with_flags(
                    OpenFlags::SQLITE_OPEN_READ_WRITE
                        | OpenFlags::SQLITE_OPEN_CREATE
                        | OpenFlags::SQLITE_OPEN_URI,
                )
            }
            DatabaseLocation::File(path) => SqliteConnectionManager::file(path),
        };

        manager.with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        })
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Initialize the database schema. Safe to run repeatedly.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Remove every row from every table, keeping the schema
    pub fn reset(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        for table in TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])
                .with_context(|| format!("Failed to clear table {}", table))?;
        }
        tx.commit().context("Failed to commit reset")?;
        tracing::info!("Database reset: all tables cleared");
        Ok(())
    }

    /// Row count of every table, parents first
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        let conn = self.connection()?;
        let mut counts = Vec::with_capacity(TABLES.len());
        for table in TABLES.iter().rev() {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .with_context(|| format!("Failed to count rows in {}", table))?;
            counts.push((*table, count));
        }
        Ok(counts)
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}
