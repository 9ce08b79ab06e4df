//! Source selection and freshness policies.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Which backing source(s) a read consults, and in what order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourcePolicy {
  /// Always read remote, write the result through to local storage
  RemoteOnly,
  /// Only read local storage, regardless of its age
  LocalOnly,
  /// Try remote, read local storage if that fails
  RemoteWithLocalFallback,
  /// Read local storage while it is fresh, otherwise remote with local fallback
  #[default]
  LocalWithRemoteRefresh,
}

/// Returns true iff `now - last_update <= window`.
pub fn is_fresh(last_update: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
  now - last_update <= window
}

/// Time-based freshness policy for the cached collection.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
  expiration: Duration,
}

impl CachePolicy {
  pub const DEFAULT_EXPIRATION_SECS: i64 = 3600;

  pub fn new(expiration: Duration) -> Self {
    Self { expiration }
  }

  pub fn expiration(&self) -> Duration {
    self.expiration
  }

  /// Whether data stamped at `last_update` is still valid at `now`.
  pub fn is_valid(&self, last_update: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    is_fresh(last_update, now, self.expiration)
  }
}

impl Default for CachePolicy {
  fn default() -> Self {
    Self::new(Duration::seconds(Self::DEFAULT_EXPIRATION_SECS))
  }
}
