//! Expiring key-value store trait and types.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size information about the entries a store currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of live (unexpired) entries.
    pub entry_count: usize,
    /// Total size of the live values in bytes.
    pub total_size_bytes: u64,
}

/// Backing store for every cache in this crate.
///
/// Keys are plain strings, values are opaque bytes. Expiry is best-effort and
/// time-based; the store makes no ordering or eviction-count guarantees and
/// enforces no size bound.
///
/// Return values follow one convention: `Ok(Some(_))` is a hit, `Ok(None)` a
/// miss and `Err(_)` a store fault. Callers in the cache layer treat the last
/// two alike but log faults.
///
/// Implementations must be safe for concurrent use. No multi-key atomicity is
/// expected.
pub trait KeyValueStore: Send + Sync {
    /// Check if a live entry exists under `key`.
    fn has(&self, key: &str) -> Result<bool>;

    /// Get the value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key` for `ttl`.
    ///
    /// Overwrites any existing entry with the same key.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Delete the entry under `key`. Returns whether something was deleted.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Delete every entry whose key starts with `prefix`.
    ///
    /// Only reached when a deployer opted in to clearing.
    fn delete_prefix(&self, prefix: &str) -> Result<usize>;

    /// Current entry count and size.
    fn stats(&self) -> Result<StoreStats>;
}
