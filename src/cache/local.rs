//! Local source backed by a persistent key-value store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::StoreError;

use super::store::PersistentStore;
use super::traits::{Cacheable, LocalSource};

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Local source storing a collection of `T`, its update timestamp and the
/// user's selected subset under keys derived from `T::collection()`.
pub struct LocalStore<T, S> {
  store: Arc<S>,
  collection_key: String,
  timestamp_key: String,
  selected_key: String,
  _entity: PhantomData<fn() -> T>,
}

impl<T: Cacheable, S: PersistentStore> LocalStore<T, S> {
  pub fn new(store: Arc<S>) -> Self {
    let collection = T::collection();
    Self {
      store,
      collection_key: format!("stored_{}", collection),
      timestamp_key: format!("stored_{}_last_update", collection),
      selected_key: format!("selected_{}", collection),
      _entity: PhantomData,
    }
  }

  async fn read<V: DeserializeOwned>(&self, key: &str) -> StoreResult<V> {
    let data = self.store.fetch(key).await?;
    serde_json::from_slice(&data).map_err(|e| StoreError::Decode(e.to_string()))
  }
}

fn encode<V: Serialize + ?Sized>(value: &V) -> StoreResult<Vec<u8>> {
  serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

#[async_trait]
impl<T: Cacheable, S: PersistentStore> LocalSource<T> for LocalStore<T, S> {
  async fn fetch(&self) -> StoreResult<Vec<T>> {
    if !self.store.exists(&self.collection_key).await {
      return Err(StoreError::NotFound(self.collection_key.clone()));
    }
    self.read(&self.collection_key).await
  }

  async fn save(&self, items: &[T]) -> StoreResult<()> {
    // Collection first, then the stamp, committed together
    let entries = vec![
      (self.collection_key.clone(), encode(items)?),
      (self.timestamp_key.clone(), encode(&Utc::now())?),
    ];
    self.store.save_batch(entries).await
  }

  async fn clear(&self) -> StoreResult<()> {
    self
      .store
      .remove_batch(&[self.collection_key.as_str(), self.timestamp_key.as_str()])
      .await
  }

  async fn exists(&self) -> bool {
    self.store.exists(&self.collection_key).await
  }

  async fn last_update_time(&self) -> Option<DateTime<Utc>> {
    self.read(&self.timestamp_key).await.ok()
  }

  async fn fetch_selected(&self) -> StoreResult<Vec<T>> {
    match self.read(&self.selected_key).await {
      Err(StoreError::NotFound(_)) => Ok(Vec::new()),
      other => other,
    }
  }

  async fn save_selected(&self, items: &[T]) -> StoreResult<()> {
    self.store.save(&self.selected_key, encode(items)?).await
  }

  async fn clear_selected(&self) -> StoreResult<()> {
    self.store.remove(&self.selected_key).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::store::{MemoryStore, SqliteStore};
  use serde::Deserialize;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: String,
    value: i64,
  }

  impl Cacheable for Item {
    fn cache_key(&self) -> String {
      self.id.clone()
    }

    fn collection() -> &'static str {
      "items"
    }
  }

  fn item(id: &str, value: i64) -> Item {
    Item {
      id: id.to_string(),
      value,
    }
  }

  #[tokio::test]
  async fn test_fetch_without_data_is_not_found() {
    let local = LocalStore::<Item, _>::new(Arc::new(MemoryStore::new()));

    assert!(!local.exists().await);
    assert_eq!(
      local.fetch().await,
      Err(StoreError::NotFound("stored_items".to_string()))
    );
    assert_eq!(local.last_update_time().await, None);
  }

  #[tokio::test]
  async fn test_save_stamps_and_round_trips() {
    let local = LocalStore::<Item, _>::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
    let items = vec![item("b", 2), item("a", 1)];

    let before = Utc::now();
    local.save(&items).await.unwrap();

    assert!(local.exists().await);
    assert_eq!(local.fetch().await.unwrap(), items);
    let stamped = local.last_update_time().await.unwrap();
    assert!(stamped >= before);
  }

  #[tokio::test]
  async fn test_clear_removes_collection_and_stamp() {
    let store = Arc::new(MemoryStore::new());
    let local = LocalStore::<Item, _>::new(store.clone());
    local.save(&[item("a", 1)]).await.unwrap();
    local.save_selected(&[item("a", 1)]).await.unwrap();

    local.clear().await.unwrap();

    assert!(!local.exists().await);
    assert_eq!(local.last_update_time().await, None);
    // The selected set has its own lifecycle
    assert_eq!(local.fetch_selected().await.unwrap(), vec![item("a", 1)]);
  }

  #[tokio::test]
  async fn test_selected_defaults_to_empty() {
    let local = LocalStore::<Item, _>::new(Arc::new(MemoryStore::new()));
    assert!(local.fetch_selected().await.unwrap().is_empty());

    local
      .save_selected(&[item("x", 1), item("y", 2)])
      .await
      .unwrap();
    assert_eq!(local.fetch_selected().await.unwrap().len(), 2);

    local.clear_selected().await.unwrap();
    assert!(local.fetch_selected().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_corrupt_blob_is_decode_error() {
    let store = Arc::new(MemoryStore::new());
    store.save("stored_items", b"not json".to_vec()).await.unwrap();
    let local = LocalStore::<Item, _>::new(store);

    assert!(matches!(local.fetch().await, Err(StoreError::Decode(_))));
  }
}
