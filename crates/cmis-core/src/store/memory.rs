//! In-process store on top of a mini-moka TTL cache.

use super::traits::{KeyValueStore, StoreStats};
use crate::config::SessionParameterDefaults;
use crate::error::Result;
use mini_moka::sync::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
struct MemoryEntry {
    value: Arc<[u8]>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory store.
///
/// mini-moka only supports one cache-wide time-to-live, so every entry also
/// carries its own deadline and is treated as absent once that passes. The
/// cache-wide TTL is the upper bound: an entry never outlives it, whatever TTL
/// it was written with.
///
/// Cloning is cheap and shares the underlying entries.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Cache<String, MemoryEntry>,
    max_ttl: Duration,
}

impl MemoryStore {
    /// Create a store whose longest entry lifetime is the repository-info TTL,
    /// the longest default of any cache.
    pub fn new() -> Self {
        Self::with_max_ttl(SessionParameterDefaults::CACHE_TTL_REPOSITORIES)
    }

    /// Create a store with a custom upper bound on entry lifetime.
    ///
    /// The bound is clamped to [`SessionParameterDefaults::MAX_CACHE_TTL`].
    pub fn with_max_ttl(max_ttl: Duration) -> Self {
        let max_ttl = max_ttl.min(SessionParameterDefaults::MAX_CACHE_TTL);
        Self {
            entries: Cache::builder().time_to_live(max_ttl).build(),
            max_ttl,
        }
    }

    /// Upper bound on entry lifetime.
    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }

    fn live_entry(&self, key: &str) -> Option<MemoryEntry> {
        let key = key.to_string();
        let entry = self.entries.get(&key)?;
        if entry.is_live(Instant::now()) {
            Some(entry)
        } else {
            self.entries.invalidate(&key);
            None
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.live_entry(key).is_some())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.live_entry(key).map(|entry| entry.value.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let ttl = ttl.min(self.max_ttl);
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        let entry = MemoryEntry {
            value: Arc::from(value),
            expires_at,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        let existed = self.entries.contains_key(&key);
        self.entries.invalidate(&key);
        Ok(existed)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        for key in &keys {
            self.entries.invalidate(key);
        }

        debug!("Deleted {} memory entries with prefix '{}'", keys.len(), prefix);
        Ok(keys.len())
    }

    fn stats(&self) -> Result<StoreStats> {
        let now = Instant::now();
        let mut stats = StoreStats::default();
        for entry in self.entries.iter() {
            let value = entry.value();
            if value.is_live(now) {
                stats.entry_count += 1;
                stats.total_size_bytes += value.value.len() as u64;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("A1|oc|doc-1", b"hello", HOUR).unwrap();

        assert!(store.has("A1|oc|doc-1").unwrap());
        assert_eq!(store.get("A1|oc|doc-1").unwrap().unwrap(), b"hello");
        assert!(store.get("A1|oc|doc-2").unwrap().is_none());
    }

    #[test]
    fn test_overwrite() {
        let store = MemoryStore::new();
        store.set("k", b"one", HOUR).unwrap();
        store.set("k", b"two", HOUR).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), b"two");
    }

    #[test]
    fn test_zero_ttl_is_never_served() {
        let store = MemoryStore::new();
        store.set("k", b"gone", Duration::ZERO).unwrap();
        assert!(!store.has("k").unwrap());
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_oversized_ttls_are_clamped() {
        let store = MemoryStore::with_max_ttl(Duration::from_secs(u64::MAX));
        assert_eq!(store.max_ttl(), SessionParameterDefaults::MAX_CACHE_TTL);

        store.set("k", b"v", Duration::from_secs(u64::MAX)).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), b"v");
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        store.set("k1", b"a", HOUR).unwrap();
        store.set("k2", b"b", HOUR).unwrap();

        assert!(store.delete("k1").unwrap());
        assert!(!store.delete("k1").unwrap());
        assert!(!store.has("k1").unwrap());
        assert!(store.has("k2").unwrap());
    }

    #[test]
    fn test_delete_prefix_and_stats() {
        let store = MemoryStore::new();
        store.set("A1|oc|x", b"123", HOUR).unwrap();
        store.set("A1|oc|y", b"45", HOUR).unwrap();
        store.set("B2|oc|x", b"6", HOUR).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.total_size_bytes, 6);

        assert_eq!(store.delete_prefix("A1|").unwrap(), 2);
        assert!(!store.has("A1|oc|x").unwrap());
        assert!(store.has("B2|oc|x").unwrap());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", b"v", HOUR).unwrap();
        assert!(other.has("k").unwrap());
    }
}
