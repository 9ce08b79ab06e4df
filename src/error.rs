//! Error types for the repository boundary.
//!
//! Remote sources fail with [`TransportError`], persistent stores with
//! [`StoreError`]. Neither crosses the repository boundary: both are
//! re-classified into [`CoreError`], which is the only error callers see.

use thiserror::Error;

/// Errors surfaced by the repository and the use cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
  #[error("Network error: {0}")]
  NetworkFailure(String),

  #[error("Storage error: {0}")]
  StorageFailure(String),

  #[error("Invalid data: the data format is incorrect")]
  InvalidData,

  #[error("Repository error: {0}")]
  RepositoryFailure(String),

  /// Local store miss. Usually turned into a fallback attempt.
  #[error("Resource not found")]
  NotFound,
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
  /// Re-classify an opaque error.
  ///
  /// A `CoreError` passes through unchanged; transport and store errors are
  /// mapped with their `From` impls; anything else is a repository failure.
  pub fn from_report(report: color_eyre::Report) -> Self {
    let report = match report.downcast::<CoreError>() {
      Ok(err) => return err,
      Err(report) => report,
    };
    let report = match report.downcast::<TransportError>() {
      Ok(err) => return err.into(),
      Err(report) => report,
    };
    match report.downcast::<StoreError>() {
      Ok(err) => err.into(),
      Err(report) => CoreError::RepositoryFailure(report.to_string()),
    }
  }

  /// Whether this error came from the network side.
  pub fn is_network(&self) -> bool {
    matches!(self, CoreError::NetworkFailure(_))
  }
}

/// Failures of a remote source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
  #[error("Invalid URL provided: {0}")]
  InvalidUrl(String),

  #[error("Request failed with status code: {status}")]
  RequestFailed { status: u16 },

  #[error("Received invalid response from server")]
  InvalidResponse,

  #[error("Failed to decode response: {0}")]
  Decoding(String),

  #[error("Request timed out")]
  Timeout,

  #[error("No internet connection available")]
  NoConnection,

  #[error("Unknown error occurred: {0}")]
  Unknown(String),
}

/// Failures of a persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  #[error("No value stored under key {0}")]
  NotFound(String),

  #[error("Failed to encode value: {0}")]
  Encode(String),

  #[error("Failed to decode value: {0}")]
  Decode(String),

  #[error("Storage backend error: {0}")]
  Backend(String),
}

impl From<TransportError> for CoreError {
  fn from(err: TransportError) -> Self {
    match err {
      TransportError::Decoding(_) => CoreError::InvalidData,
      other => CoreError::NetworkFailure(other.to_string()),
    }
  }
}

impl From<StoreError> for CoreError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(_) => CoreError::NotFound,
      StoreError::Decode(_) => CoreError::InvalidData,
      other => CoreError::StorageFailure(other.to_string()),
    }
  }
}

impl From<rusqlite::Error> for StoreError {
  fn from(err: rusqlite::Error) -> Self {
    StoreError::Backend(err.to_string())
  }
}
