//! Use cases the application drives: fetching, searching and the user's
//! selected countries.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{Repository, SourcePolicy};
use crate::error::Result;

use super::search::{self, SortCriteria};
use super::types::Country;

/// Upper bound on the selected set.
pub const MAX_SELECTED: usize = 5;

/// Fetch the full country list.
pub struct FetchCountries<R> {
  repository: Arc<R>,
}

impl<R: Repository<Country>> FetchCountries<R> {
  pub fn new(repository: Arc<R>) -> Self {
    Self { repository }
  }

  /// Fetch with `policy`, or pick one from the state of local storage.
  pub async fn execute(&self, policy: Option<SourcePolicy>) -> Result<Vec<Country>> {
    let policy = match policy {
      Some(policy) => policy,
      None => self.effective_policy().await,
    };
    debug!(?policy, "fetching countries");

    self.repository.fetch_all(policy).await
  }

  async fn effective_policy(&self) -> SourcePolicy {
    if self.repository.has_valid_local_data().await {
      SourcePolicy::LocalWithRemoteRefresh
    } else {
      SourcePolicy::RemoteWithLocalFallback
    }
  }
}

/// Search and sort countries.
pub struct SearchCountries<R> {
  repository: Arc<R>,
}

impl<R: Repository<Country>> SearchCountries<R> {
  pub fn new(repository: Arc<R>) -> Self {
    Self { repository }
  }

  /// Remote-first search; the query is always sent, even when empty.
  pub async fn execute(&self, query: &str) -> Result<Vec<Country>> {
    self.repository.search(query).await
  }

  /// Filter an already-fetched list in memory.
  pub fn filter(&self, query: &str, countries: &[Country]) -> Vec<Country> {
    search::filter(query, countries)
  }

  pub fn sort(&self, countries: &[Country], criteria: SortCriteria) -> Vec<Country> {
    search::sort(countries, criteria)
  }
}

/// The user's selected countries.
pub struct SelectedCountries<R> {
  repository: Arc<R>,
  max_selected: usize,
}

impl<R: Repository<Country>> SelectedCountries<R> {
  pub fn new(repository: Arc<R>) -> Self {
    Self {
      repository,
      max_selected: MAX_SELECTED,
    }
  }

  /// Lower the limit. Values above `MAX_SELECTED` are capped.
  pub fn with_max_selected(mut self, max_selected: usize) -> Self {
    self.max_selected = max_selected.min(MAX_SELECTED);
    self
  }

  pub fn max_selected(&self) -> usize {
    self.max_selected
  }

  pub async fn fetch(&self) -> Result<Vec<Country>> {
    self.repository.fetch_selected().await
  }

  pub async fn save(&self, countries: &[Country]) -> Result<()> {
    self.repository.save_selected(countries).await
  }

  pub async fn clear(&self) -> Result<()> {
    self.repository.clear_selected().await
  }

  /// Append `country` unless it is already selected or the set is full.
  /// Returns whether it was added.
  pub async fn add(&self, country: Country) -> Result<bool> {
    let mut selected = self.fetch().await?;
    if selected.len() >= self.max_selected || selected.contains(&country) {
      return Ok(false);
    }
    selected.push(country);
    self.save(&selected).await?;
    Ok(true)
  }

  /// Remove the country with `id`. Returns whether it was selected.
  pub async fn remove(&self, id: &str) -> Result<bool> {
    let mut selected = self.fetch().await?;
    let before = selected.len();
    selected.retain(|c| c.id != id);
    if selected.len() == before {
      return Ok(false);
    }

    if selected.is_empty() {
      self.clear().await?;
    } else {
      self.save(&selected).await?;
    }
    Ok(true)
  }

  /// The saved selection, or the named default country when nothing is saved.
  pub async fn load_or_default(
    &self,
    search: &SearchCountries<R>,
    default_name: &str,
  ) -> Result<Vec<Country>> {
    let saved = match self.fetch().await {
      Ok(saved) => saved,
      Err(e) => {
        warn!(error = %e, "failed to read selected countries");
        Vec::new()
      }
    };
    if !saved.is_empty() {
      return Ok(saved);
    }

    let wanted = default_name.to_lowercase();
    let results = search.execute(&wanted).await?;
    let Some(country) = results
      .into_iter()
      .find(|c| c.name.common.to_lowercase() == wanted)
    else {
      return Ok(Vec::new());
    };

    let selected = vec![country];
    if let Err(e) = self.save(&selected).await {
      warn!(error = %e, "failed to save default country");
    }
    Ok(selected)
  }
}
