//! Supersedable async query.
//!
//! A `Query<T>` runs its fetcher on a spawned task and tracks
//! loading/success/error state. Starting a new fetch, or dropping the query,
//! aborts the task still in flight, so only the latest request can land.
//!
//! # Example
//!
//! ```ignore
//! let search = search.clone();
//! let mut query = Query::new(move || {
//!     let search = search.clone();
//!     async move { search.execute("fra").await.map_err(|e| e.to_string()) }
//! });
//!
//! query.fetch();
//! if query.settled().await {
//!     match query.state() {
//!         QueryState::Success(countries) => print(countries),
//!         QueryState::Error(e) => eprintln!("{}", e),
//!         _ => {}
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// In-flight fetch: the task and the channel its result arrives on.
struct Pending<T> {
  task: JoinHandle<()>,
  receiver: oneshot::Receiver<Result<T, String>>,
}

pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  pending: Option<Pending<T>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` starts a request.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      pending: None,
    }
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Start fetching data if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Abort any fetch in flight and start a new one.
  pub fn refetch(&mut self) {
    self.cancel();
    self.start_fetch();
  }

  /// Abort the fetch in flight, if any. The previous state is kept.
  pub fn cancel(&mut self) {
    if let Some(pending) = self.pending.take() {
      pending.task.abort();
      if self.state.is_loading() {
        self.state = QueryState::Idle;
      }
    }
  }

  /// Poll for results from a pending fetch without waiting.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = self.pending.as_mut() else {
      return false;
    };

    match pending.receiver.try_recv() {
      Ok(result) => {
        self.finish(Some(result));
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => false,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.finish(None);
        true
      }
    }
  }

  /// Wait for the pending fetch to finish.
  ///
  /// Returns `true` if the state changed; with nothing pending it never
  /// completes, which makes it usable as a `select!` branch.
  pub async fn settled(&mut self) -> bool {
    let Some(pending) = self.pending.as_mut() else {
      return std::future::pending().await;
    };

    let result = (&mut pending.receiver).await.ok();
    self.finish(result);
    true
  }

  fn finish(&mut self, result: Option<Result<T, String>>) {
    self.pending = None;
    self.state = match result {
      Some(Ok(data)) => QueryState::Success(data),
      Some(Err(error)) => QueryState::Error(error),
      // Sender dropped without sending
      None => QueryState::Error("Query was cancelled".to_string()),
    };
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = oneshot::channel();
    let future = (self.fetcher)();
    let task = tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });

    self.pending = Some(Pending { task, receiver: rx });
    self.state = QueryState::Loading;
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    if let Some(pending) = self.pending.take() {
      pending.task.abort();
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("pending", &self.pending.is_some())
      .finish_non_exhaustive()
  }
}
