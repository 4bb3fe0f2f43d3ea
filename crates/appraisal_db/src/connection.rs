//! Scoped store connections.
//!
//! Every unit of work opens its own connection and closes it before returning.
//! There is no pool: concurrent callers are serialized by SQLite itself, and the
//! busy timeout turns a locked file into a wait instead of an immediate error.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteSynchronous};
use sqlx::Connection;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file
    pub path: PathBuf,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// Handle to the single-file store. Cheap to clone; holds no open connection.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl Store {
    pub fn new(config: StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        Ok(Self {
            path: config.path,
            options,
        })
    }

    /// Open a store at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(StoreConfig::new(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open one connection for one unit of work.
    pub async fn acquire(&self) -> Result<ScopedConnection> {
        let conn = SqliteConnection::connect_with(&self.options)
            .await
            .inspect_err(|e| error!(path = %self.path.display(), "Database error: {}", e))?;
        debug!(path = %self.path.display(), "Connection opened");
        Ok(ScopedConnection {
            conn,
            opened_at: Instant::now(),
        })
    }
}

/// A connection owned by exactly one unit of work.
///
/// Call [`ScopedConnection::release`] with the unit's outcome. If the scope is
/// left any other way (early return, panic, cancelled future) dropping the
/// connection closes the underlying SQLite handle.
pub struct ScopedConnection {
    conn: SqliteConnection,
    opened_at: Instant,
}

impl ScopedConnection {
    /// Close the connection, then hand back the outcome of the work done on it.
    ///
    /// Errors from the work are logged here and returned unchanged; a close
    /// failure is only reported when the work itself succeeded.
    pub async fn release<T>(self, outcome: Result<T>) -> Result<T> {
        let elapsed = self.opened_at.elapsed();
        let closed = self.conn.close().await;
        debug!(elapsed_ms = elapsed.as_millis() as u64, "Connection released");

        match outcome {
            Err(err) => {
                error!("Database error: {}", err);
                Err(err)
            }
            Ok(value) => {
                closed?;
                Ok(value)
            }
        }
    }
}

impl Deref for ScopedConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for ScopedConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("nested").join("test.db");

        let store = Store::open(&db_path).unwrap();
        let conn = store.acquire().await.unwrap();
        conn.release(Ok(())).await.unwrap();

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_release_propagates_work_error() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path().join("test.db")).unwrap();

        let mut conn = store.acquire().await.unwrap();
        let outcome = sqlx::query("SELECT * FROM missing_table")
            .execute(&mut *conn)
            .await
            .map(|_| ())
            .map_err(DbError::from);
        let result = conn.release(outcome).await;

        assert!(matches!(result, Err(DbError::Sqlx(_))));
    }

    #[tokio::test]
    async fn test_each_acquire_is_a_fresh_connection() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path().join("test.db")).unwrap();

        let mut first = store.acquire().await.unwrap();
        sqlx::query("CREATE TEMP TABLE scratch (x INTEGER)")
            .execute(&mut *first)
            .await
            .unwrap();
        first.release(Ok(())).await.unwrap();

        // Temp tables die with their connection.
        let mut second = store.acquire().await.unwrap();
        let outcome = sqlx::query("SELECT x FROM scratch")
            .execute(&mut *second)
            .await
            .map(|_| ())
            .map_err(DbError::from);
        assert!(second.release(outcome).await.is_err());
    }
}
