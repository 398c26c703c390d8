//! Error types for cache operations.

use thiserror::Error;

/// Errors that can occur while reading or writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A value could not be serialized for storage.
    #[error("cache serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backing store rejected the operation.
    #[error("cache backend error: {0}")]
    Backend(String),
}
