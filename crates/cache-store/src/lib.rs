//! Advisory key/value cache for Probe.
//!
//! This crate defines the cache seam used by the credit ledger and the
//! analysis services:
//!
//! - [`CacheStore`] - The trait every cache backend implements
//! - [`CacheStoreExt`] - Typed read/write helpers on top of any store
//! - [`InMemoryCacheStore`] - The in-process backend
//! - [`keys`] - Builders for the exact cache key formats
//!
//! Entries are advisory. Every miss can be rebuilt from the database, so a
//! failed write is logged by callers and never fails a request.
//!
//! # Example
//!
//! ```rust
//! use cache_store::{keys, CacheStore, CacheStoreExt, EntryKind, InMemoryCacheStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cache_store::CacheError> {
//!     let cache = InMemoryCacheStore::new();
//!     let key = keys::profile("42");
//!
//!     cache.write_as(&key, EntryKind::Profile, &serde_json::json!({"credits": 50})).await?;
//!     let value: Option<serde_json::Value> = cache.read_as(&key, EntryKind::Profile).await?;
//!     assert_eq!(value.unwrap()["credits"], 50);
//!     Ok(())
//! }
//! ```

mod error;
pub mod keys;
mod memory;
mod store;

pub use error::CacheError;
pub use memory::InMemoryCacheStore;
pub use store::{CacheEntry, CacheStore, CacheStoreExt, EntryKind};

// Re-export async_trait for backend implementors
pub use async_trait::async_trait;
