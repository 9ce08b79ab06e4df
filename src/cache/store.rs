//! Persistent key-value store trait with SQLite and in-memory backends.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Async key-value storage of serialized blobs.
///
/// Implementations serialize their own access: concurrent calls against the
/// same key are linearized, and a batch is applied all-or-nothing.
#[async_trait]
pub trait PersistentStore: Send + Sync {
  /// Write all entries atomically.
  async fn save_batch(&self, entries: Vec<(String, Vec<u8>)>) -> StoreResult<()>;

  /// Read the blob stored under `key`, or `StoreError::NotFound`.
  async fn fetch(&self, key: &str) -> StoreResult<Vec<u8>>;

  /// Remove all keys atomically. Missing keys are ignored.
  async fn remove_batch(&self, keys: &[&str]) -> StoreResult<()>;

  async fn exists(&self, key: &str) -> bool;

  async fn save(&self, key: &str, data: Vec<u8>) -> StoreResult<()> {
    self.save_batch(vec![(key.to_string(), data)]).await
  }

  async fn remove(&self, key: &str) -> StoreResult<()> {
    self.remove_batch(&[key]).await
  }
}

/// SQLite-based store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) the store at the default location.
  pub fn open_default() -> StoreResult<Self> {
    let path = Self::default_path()?;
    Self::open(&path)
  }

  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> StoreResult<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| StoreError::Backend(format!("Failed to create store directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      StoreError::Backend(format!(
        "Failed to open store at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_connection(conn)
  }

  pub fn open_in_memory() -> StoreResult<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> StoreResult<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> StoreResult<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::Backend("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("countries").join("store.db"))
  }

  fn run_migrations(&self) -> StoreResult<()> {
    self.with_conn(|conn| conn.execute_batch(STORE_SCHEMA))
  }

  fn with_conn<R>(
    &self,
    f: impl FnOnce(&mut Connection) -> rusqlite::Result<R>,
  ) -> StoreResult<R> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))?;
    Ok(f(&mut *conn)?)
  }
}

const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[async_trait]
impl PersistentStore for SqliteStore {
  async fn save_batch(&self, entries: Vec<(String, Vec<u8>)>) -> StoreResult<()> {
    self.with_conn(|conn| {
      let tx = conn.transaction()?;
      for (key, data) in &entries {
        tx.execute(
          "INSERT OR REPLACE INTO kv_store (key, data, written_at)
           VALUES (?, ?, datetime('now'))",
          params![key, data],
        )?;
      }
      tx.commit()
    })
  }

  async fn fetch(&self, key: &str) -> StoreResult<Vec<u8>> {
    let data: Option<Vec<u8>> = self.with_conn(|conn| {
      conn
        .query_row(
          "SELECT data FROM kv_store WHERE key = ?",
          params![key],
          |row| row.get(0),
        )
        .optional()
    })?;

    data.ok_or_else(|| StoreError::NotFound(key.to_string()))
  }

  async fn remove_batch(&self, keys: &[&str]) -> StoreResult<()> {
    self.with_conn(|conn| {
      let tx = conn.transaction()?;
      for key in keys {
        tx.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
      }
      tx.commit()
    })
  }

  async fn exists(&self, key: &str) -> bool {
    self
      .with_conn(|conn| {
        conn
          .query_row(
            "SELECT 1 FROM kv_store WHERE key = ?",
            params![key],
            |_| Ok(()),
          )
          .optional()
      })
      .map(|found| found.is_some())
      .unwrap_or(false)
  }
}

/// Store that keeps everything in process memory.
/// Used when persistence is disabled, and in tests.
#[derive(Default)]
pub struct MemoryStore {
  entries: tokio::sync::Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl PersistentStore for MemoryStore {
  async fn save_batch(&self, entries: Vec<(String, Vec<u8>)>) -> StoreResult<()> {
    let mut map = self.entries.lock().await;
    map.extend(entries);
    Ok(())
  }

  async fn fetch(&self, key: &str) -> StoreResult<Vec<u8>> {
    let map = self.entries.lock().await;
    map
      .get(key)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(key.to_string()))
  }

  async fn remove_batch(&self, keys: &[&str]) -> StoreResult<()> {
    let mut map = self.entries.lock().await;
    for key in keys {
      map.remove(*key);
    }
    Ok(())
  }

  async fn exists(&self, key: &str) -> bool {
    self.entries.lock().await.contains_key(key)
  }
}
