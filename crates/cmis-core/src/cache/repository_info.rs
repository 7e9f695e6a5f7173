//! Repository-info cache.

use crate::config::SessionParameters;
use crate::models::RepositoryInfo;
use crate::store::KeyValueStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One [`RepositoryInfo`] per repository id, stored under the percent-encoded
/// id. Encoded ids never contain the key separator, so they cannot collide
/// with object or type keys.
pub struct RepositoryInfoCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl RepositoryInfoCache {
    pub fn new(store: Arc<dyn KeyValueStore>, params: &SessionParameters) -> Self {
        Self {
            store,
            ttl: params.repository_ttl(),
        }
    }

    fn key(repository_id: &str) -> String {
        urlencoding::encode(repository_id).into_owned()
    }

    pub fn put(&self, info: &RepositoryInfo) {
        if info.id.is_empty() {
            return;
        }
        let bytes = match serde_json::to_vec(info) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode repository info '{}': {}", info.id, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&Self::key(&info.id), &bytes, self.ttl) {
            warn!("Failed to cache repository info '{}': {}", info.id, e);
        }
    }

    pub fn get(&self, repository_id: &str) -> Option<RepositoryInfo> {
        let bytes = match self.store.get(&Self::key(repository_id)) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Repository info cache read of '{}' failed: {}", repository_id, e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(info) => {
                debug!("Repository info cache hit for '{}'", repository_id);
                Some(info)
            }
            Err(e) => {
                warn!("Discarding unreadable repository info '{}': {}", repository_id, e);
                None
            }
        }
    }

    pub fn remove(&self, repository_id: &str) {
        if let Err(e) = self.store.delete(&Self::key(repository_id)) {
            warn!("Failed to remove repository info '{}': {}", repository_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cache() -> (Arc<MemoryStore>, RepositoryInfoCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = RepositoryInfoCache::new(store.clone(), &SessionParameters::default());
        (store, cache)
    }

    #[test]
    fn test_put_get_remove() {
        let (_, cache) = cache();
        let info = RepositoryInfo::new("A1", "root-1");

        assert!(cache.get("A1").is_none());
        cache.put(&info);
        assert_eq!(cache.get("A1"), Some(info));

        cache.remove("A1");
        assert!(cache.get("A1").is_none());
    }

    #[test]
    fn test_unreadable_entry_is_a_miss() {
        let (store, cache) = cache();
        store.set("A1", b"{broken", Duration::from_secs(60)).unwrap();
        assert!(cache.get("A1").is_none());
    }

    #[test]
    fn test_id_with_separator_is_encoded() {
        let (store, cache) = cache();
        cache.put(&RepositoryInfo::new("A1|oc|doc-1", "root-1"));

        assert!(!store.has("A1|oc|doc-1").unwrap());
        assert!(store.has("A1%7Coc%7Cdoc-1").unwrap());
        assert!(cache.get("A1|oc|doc-1").is_some());
    }
}
