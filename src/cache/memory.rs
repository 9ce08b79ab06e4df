//! Single-owner in-memory cell for the last loaded collection.

use std::future::Future;
use tokio::sync::Mutex;

/// Holds an optional collection behind an async mutex, so no two
/// mutations interleave.
#[derive(Debug)]
pub struct MemoryCache<T> {
  cell: Mutex<Option<Vec<T>>>,
}

impl<T: Clone> MemoryCache<T> {
  pub fn new() -> Self {
    Self {
      cell: Mutex::new(None),
    }
  }

  pub async fn get(&self) -> Option<Vec<T>> {
    self.cell.lock().await.clone()
  }

  pub async fn store(&self, items: Vec<T>) {
    *self.cell.lock().await = Some(items);
  }

  pub async fn clear(&self) {
    *self.cell.lock().await = None;
  }

  /// Return the cached collection, or run `loader` and cache its result.
  ///
  /// The lock is held while loading, so concurrent callers wait for the
  /// first load instead of starting their own.
  pub async fn get_or_try_load<F, Fut, E>(&self, loader: F) -> Result<Vec<T>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
  {
    let mut cell = self.cell.lock().await;
    if let Some(items) = cell.as_ref() {
      return Ok(items.clone());
    }

    let items = loader().await?;
    *cell = Some(items.clone());
    Ok(items)
  }
}

impl<T: Clone> Default for MemoryCache<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  #[tokio::test]
  async fn test_store_get_clear() {
    let cache = MemoryCache::new();
    assert_eq!(cache.get().await, None);

    cache.store(vec![1, 2, 3]).await;
    assert_eq!(cache.get().await, Some(vec![1, 2, 3]));

    cache.clear().await;
    assert_eq!(cache.get().await, None);
  }

  #[tokio::test]
  async fn test_loader_runs_once() {
    let cache = Arc::new(MemoryCache::new());
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..5 {
      let cache = cache.clone();
      let calls = calls.clone();
      handles.push(tokio::spawn(async move {
        cache
          .get_or_try_load(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec!["loaded"])
          })
          .await
      }));
    }

    for handle in handles {
      assert_eq!(handle.await.unwrap(), Ok(vec!["loaded"]));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_failed_load_is_not_cached() {
    let cache: MemoryCache<i32> = MemoryCache::new();

    let result = cache
      .get_or_try_load(|| async { Err::<Vec<i32>, _>("offline") })
      .await;
    assert_eq!(result, Err("offline"));
    assert_eq!(cache.get().await, None);

    let result = cache
      .get_or_try_load(|| async { Ok::<_, &str>(vec![7]) })
      .await;
    assert_eq!(result, Ok(vec![7]));
  }
}
