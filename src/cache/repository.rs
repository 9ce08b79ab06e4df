//! Tiered repository that orchestrates a remote and a local source.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};

use super::policy::{CachePolicy, SourcePolicy};
use super::traits::{Cacheable, LocalSource, RemoteSource, Repository, Searchable};

/// Repository that decides, per read, whether to hit the network, local
/// storage or both, and keeps local storage in step with the network.
///
/// Successful remote fetches are written through to local storage on a
/// best-effort basis: a failed write is logged and the fetched entities are
/// still returned.
pub struct TieredRepository<T, R, L> {
  remote: Arc<R>,
  local: Arc<L>,
  cache_policy: CachePolicy,
  _entity: PhantomData<fn() -> T>,
}

impl<T, R, L> TieredRepository<T, R, L>
where
  T: Cacheable + Searchable,
  R: RemoteSource<T>,
  L: LocalSource<T>,
{
  pub fn new(remote: Arc<R>, local: Arc<L>) -> Self {
    Self {
      remote,
      local,
      cache_policy: CachePolicy::default(),
      _entity: PhantomData,
    }
  }

  /// Set the freshness policy for the local collection.
  pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
    self.cache_policy = cache_policy;
    self
  }

  async fn fetch_remote(&self) -> Result<Vec<T>> {
    let items = normalize(self.remote.fetch().await?);
    debug!(
      collection = T::collection(),
      count = items.len(),
      "fetched from remote"
    );

    if let Err(e) = self.local.save(&items).await {
      warn!(collection = T::collection(), error = %e, "write-through to local storage failed");
    }

    Ok(items)
  }

  async fn fetch_local(&self) -> Result<Vec<T>> {
    let items = normalize(self.local.fetch().await?);
    debug!(
      collection = T::collection(),
      count = items.len(),
      "loaded from local storage"
    );
    Ok(items)
  }

  async fn fetch_remote_with_fallback(&self) -> Result<Vec<T>> {
    let remote_err = match self.fetch_remote().await {
      Ok(items) => return Ok(items),
      Err(e) => e,
    };

    match self.fetch_local().await {
      Ok(items) => {
        info!(
          collection = T::collection(),
          remote_error = %remote_err,
          "remote unavailable, serving local data"
        );
        Ok(items)
      }
      Err(local_err) => {
        // The local error is surfaced; keep the remote one in the logs
        warn!(
          collection = T::collection(),
          remote_error = %remote_err,
          local_error = %local_err,
          "both sources failed"
        );
        Err(local_err)
      }
    }
  }
}

/// Drop entities with an empty key and every repeat of a key already seen.
fn normalize<T: Cacheable>(items: Vec<T>) -> Vec<T> {
  let total = items.len();
  let mut seen = HashSet::with_capacity(total);
  let kept: Vec<T> = items
    .into_iter()
    .filter(|item| {
      let key = item.cache_key();
      !key.is_empty() && seen.insert(key)
    })
    .collect();

  if kept.len() != total {
    warn!(
      collection = T::collection(),
      dropped = total - kept.len(),
      "dropped entities with empty or duplicate keys"
    );
  }
  kept
}

fn storage_failure(err: impl std::fmt::Display) -> CoreError {
  CoreError::StorageFailure(err.to_string())
}

#[async_trait]
impl<T, R, L> Repository<T> for TieredRepository<T, R, L>
where
  T: Cacheable + Searchable,
  R: RemoteSource<T>,
  L: LocalSource<T>,
{
  async fn fetch_all(&self, policy: SourcePolicy) -> Result<Vec<T>> {
    debug!(collection = T::collection(), ?policy, "fetch_all");

    match policy {
      SourcePolicy::RemoteOnly => self.fetch_remote().await,
      SourcePolicy::LocalOnly => self.fetch_local().await,
      SourcePolicy::RemoteWithLocalFallback => self.fetch_remote_with_fallback().await,
      SourcePolicy::LocalWithRemoteRefresh => {
        if self.has_valid_local_data().await {
          self.fetch_local().await
        } else {
          self.fetch_remote_with_fallback().await
        }
      }
    }
  }

  async fn search(&self, query: &str) -> Result<Vec<T>> {
    let remote_err = match self.remote.search_by_name(query).await {
      Ok(items) => return Ok(normalize(items)),
      Err(e) => e,
    };

    info!(
      collection = T::collection(),
      query,
      error = %remote_err,
      "remote search failed, filtering local data"
    );
    let items = self.fetch_local().await?;
    Ok(items.into_iter().filter(|item| item.matches(query)).collect())
  }

  async fn update_local_storage(&self, items: &[T]) -> Result<()> {
    self.local.save(items).await.map_err(storage_failure)
  }

  async fn clear_local_storage(&self) -> Result<()> {
    self.local.clear().await.map_err(storage_failure)
  }

  async fn has_valid_local_data(&self) -> bool {
    let Some(last_update) = self.local.last_update_time().await else {
      return false;
    };
    if !self.cache_policy.is_valid(last_update, Utc::now()) {
      return false;
    }
    self.local.exists().await
  }

  async fn fetch_selected(&self) -> Result<Vec<T>> {
    Ok(self.local.fetch_selected().await?)
  }

  async fn save_selected(&self, items: &[T]) -> Result<()> {
    self.local.save_selected(items).await.map_err(storage_failure)
  }

  async fn clear_selected(&self) -> Result<()> {
    self.local.clear_selected().await.map_err(storage_failure)
  }
}

impl<T, R, L> Clone for TieredRepository<T, R, L> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
      local: Arc::clone(&self.local),
      cache_policy: self.cache_policy,
      _entity: PhantomData,
    }
  }
}
