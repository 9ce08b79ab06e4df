//! Core traits for the caching system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, StoreError, TransportError};

use super::policy::SourcePolicy;

/// Trait for entities that can be cached.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Unique identifier for this entity (e.g., a country's common name)
  fn cache_key(&self) -> String;

  /// Collection name for storage organization (e.g., "countries")
  fn collection() -> &'static str;
}

/// Entities that can be matched against a free-text query in memory.
pub trait Searchable {
  /// Case-insensitive substring match over the entity's searchable fields.
  fn matches(&self, query: &str) -> bool;
}

/// Network-backed source of entities.
#[async_trait]
pub trait RemoteSource<T>: Send + Sync {
  async fn fetch(&self) -> std::result::Result<Vec<T>, TransportError>;

  async fn search_by_name(&self, query: &str) -> std::result::Result<Vec<T>, TransportError>;
}

/// Device-local source of entities.
#[async_trait]
pub trait LocalSource<T>: Send + Sync {
  /// Stored collection. Fails with `StoreError::NotFound` when nothing is stored.
  async fn fetch(&self) -> std::result::Result<Vec<T>, StoreError>;

  /// Replace the stored collection and stamp the update time.
  async fn save(&self, items: &[T]) -> std::result::Result<(), StoreError>;

  /// Remove the stored collection and its update time.
  async fn clear(&self) -> std::result::Result<(), StoreError>;

  async fn exists(&self) -> bool;

  async fn last_update_time(&self) -> Option<DateTime<Utc>>;

  async fn fetch_selected(&self) -> std::result::Result<Vec<T>, StoreError>;

  async fn save_selected(&self, items: &[T]) -> std::result::Result<(), StoreError>;

  async fn clear_selected(&self) -> std::result::Result<(), StoreError>;
}

/// Repository protocol exposed to the use cases.
#[async_trait]
pub trait Repository<T>: Send + Sync {
  /// Fetch the full collection, consulting the sources `policy` selects.
  async fn fetch_all(&self, policy: SourcePolicy) -> Result<Vec<T>>;

  /// Remote text search, falling back to filtering the local collection.
  async fn search(&self, query: &str) -> Result<Vec<T>>;

  async fn update_local_storage(&self, items: &[T]) -> Result<()>;

  async fn clear_local_storage(&self) -> Result<()>;

  /// Fresh timestamp, and the local store reports the collection exists.
  async fn has_valid_local_data(&self) -> bool;

  async fn fetch_selected(&self) -> Result<Vec<T>>;

  async fn save_selected(&self, items: &[T]) -> Result<()>;

  async fn clear_selected(&self) -> Result<()>;

  async fn fetch_all_default(&self) -> Result<Vec<T>> {
    self.fetch_all(SourcePolicy::default()).await
  }
}
