//! Generic tiered caching layer.
//!
//! This module knows nothing about countries. It provides:
//! - Source policies that choose between a remote and a local source per read
//! - A time-based freshness policy for the locally stored collection
//! - A persistent key-value store (SQLite or in-memory) and a local source over it
//! - A tiered repository that writes remote results through to local storage

mod local;
mod memory;
mod policy;
mod repository;
mod store;
mod traits;

pub use local::LocalStore;
pub use memory::MemoryCache;
pub use policy::{CachePolicy, SourcePolicy};
pub use repository::TieredRepository;
pub use store::{MemoryStore, PersistentStore, SqliteStore};
pub use traits::{Cacheable, LocalSource, RemoteSource, Repository, Searchable};
