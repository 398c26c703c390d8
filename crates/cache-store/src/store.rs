//! The CacheStore trait and typed helpers.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CacheError;

/// What a cached value holds. Checked on typed reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// An account profile snapshot under `user:<id>`.
    Profile,
    /// A page of analysis summaries.
    Listing,
    /// One saved analysis.
    Record,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Profile => "profile",
            EntryKind::Listing => "listing",
            EntryKind::Record => "record",
        }
    }
}

/// A tagged, serialized cache value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Kind discriminator.
    pub kind: EntryKind,
    /// JSON text.
    pub value: String,
}

impl CacheEntry {
    pub fn new(kind: EntryKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A key/value store of serialized values.
///
/// Implementations must be safe to share across request tasks; this trait
/// is object-safe and is normally held as `Arc<dyn CacheStore>`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `entry` under `key`, replacing any previous value.
    async fn write(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;

    /// Read the raw entry under `key`.
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Remove one key. Returns whether it was present.
    async fn delete_key(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every key starting with `prefix`. Returns how many were removed.
    async fn delete_pattern(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}

/// Typed access on top of any [`CacheStore`].
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// Serialize `value` as JSON and store it tagged with `kind`.
    async fn write_as<T>(&self, key: &str, kind: EntryKind, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        self.write(key, CacheEntry::new(kind, json)).await
    }

    /// Read and deserialize the value under `key`.
    ///
    /// An entry with a different kind tag, or one that no longer parses as
    /// `T`, is logged and reported as a miss.
    async fn read_as<T>(&self, key: &str, kind: EntryKind) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        let Some(entry) = self.read(key).await? else {
            return Ok(None);
        };

        if entry.kind != kind {
            warn!(
                key,
                expected = kind.as_str(),
                found = entry.kind.as_str(),
                "Cache entry kind mismatch, treating as miss"
            );
            return Ok(None);
        }

        match serde_json::from_str(&entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Cache entry failed to parse, treating as miss");
                Ok(None)
            }
        }
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
