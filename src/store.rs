// Durable usage counters backed by SQLite.
// Each operation opens its own connection and commits before returning.
// Concurrency is left to SQLite: WAL mode lets readers run alongside the
// single writer, and the busy timeout queues competing writers.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const QUERIES_KEY: &str = "queries";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// Current totals as served by `/visit` and `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub queries: i64,
    pub visitors: i64,
}

#[derive(Debug, Clone)]
pub struct StatsStore {
    path: Arc<PathBuf>,
}

impl StatsStore {
    // Open (creating if needed) the database at `path`. Safe on every start.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { path: Arc::new(path) };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(self.path.as_path())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            "BEGIN;
             CREATE TABLE IF NOT EXISTS metrics (
                 key TEXT PRIMARY KEY,
                 value INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS visitors (
                 id TEXT PRIMARY KEY,
                 first_seen TEXT DEFAULT CURRENT_TIMESTAMP
             );
             INSERT OR IGNORE INTO metrics(key, value) VALUES('queries', 0);
             COMMIT;",
        )?;
        Ok(())
    }

    pub fn increment_queries(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE metrics SET value = value + 1 WHERE key = ?1",
            [QUERIES_KEY],
        )?;
        Ok(())
    }

    // Remember a visitor. Empty ids are ignored and repeats keep their
    // original `first_seen`.
    pub fn upsert_visitor(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Ok(());
        }
        let conn = self.connect()?;
        conn.execute("INSERT OR IGNORE INTO visitors(id) VALUES(?1)", [id])?;
        Ok(())
    }

    pub fn read_stats(&self) -> Result<Stats> {
        let conn = self.connect()?;
        let queries: Option<i64> = conn
            .query_row(
                "SELECT value FROM metrics WHERE key = ?1",
                [QUERIES_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let visitors: i64 = conn.query_row("SELECT COUNT(1) FROM visitors", [], |row| row.get(0))?;

        Ok(Stats {
            queries: queries.unwrap_or(0),
            visitors,
        })
    }

    // Run a store operation on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&StatsStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn first_seen(store: &StatsStore, id: &str) -> String {
        let conn = store.connect().unwrap();
        conn.query_row("SELECT first_seen FROM visitors WHERE id = ?1", [id], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn fresh_store_is_empty() {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db")).unwrap();
        assert_eq!(store.read_stats().unwrap(), Stats { queries: 0, visitors: 0 });
    }

    #[test]
    fn counts_queries_and_visitors() {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db")).unwrap();

        store.increment_queries().unwrap();
        store.upsert_visitor("abc").unwrap();

        assert_eq!(store.read_stats().unwrap(), Stats { queries: 1, visitors: 1 });
    }

    #[test]
    fn upsert_visitor_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db")).unwrap();

        store.upsert_visitor("abc").unwrap();
        let seen = first_seen(&store, "abc");
        store.upsert_visitor("abc").unwrap();
        store.upsert_visitor("").unwrap();

        assert_eq!(store.read_stats().unwrap().visitors, 1);
        assert_eq!(first_seen(&store, "abc"), seen);
    }

    #[test]
    fn reopen_keeps_counters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.db");

        let store = StatsStore::open(&path).unwrap();
        store.increment_queries().unwrap();
        store.increment_queries().unwrap();
        store.upsert_visitor("v1").unwrap();
        drop(store);

        let store = StatsStore::open(&path).unwrap();
        assert_eq!(store.read_stats().unwrap(), Stats { queries: 2, visitors: 1 });
    }

    #[test]
    fn parallel_increments_are_not_lost() {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db")).unwrap();
        let callers = 16;

        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.increment_queries().unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.read_stats().unwrap().queries, callers);
    }

    #[tokio::test]
    async fn run_executes_on_blocking_pool() {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db")).unwrap();

        store.run(|s| s.upsert_visitor("async")).await.unwrap();
        let stats = store.run(|s| s.read_stats()).await.unwrap();
        assert_eq!(stats.visitors, 1);
    }
}
