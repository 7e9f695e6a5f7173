//! Type-definition cache.

use crate::config::{CacheKeys, SessionParameters};
use crate::models::TypeDefinition;
use crate::store::KeyValueStore;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Type definitions keyed by repository and type id.
///
/// Bulk removal (`remove_repository`, `remove_all`) only deletes anything
/// when the deployment set `allow_cache_clear`; the backing store may be
/// shared with other clients.
pub struct TypeDefinitionCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    allow_clear: bool,
    /// Repositories this cache has written to, for `remove_all`.
    repositories: Mutex<BTreeSet<String>>,
}

impl TypeDefinitionCache {
    pub fn new(store: Arc<dyn KeyValueStore>, params: &SessionParameters) -> Self {
        Self {
            store,
            ttl: params.type_ttl(),
            allow_clear: params.allow_cache_clear,
            repositories: Mutex::new(BTreeSet::new()),
        }
    }

    fn prefix(repository_id: &str) -> String {
        format!(
            "{}{sep}{}{sep}",
            urlencoding::encode(repository_id),
            CacheKeys::TYPE_NAMESPACE,
            sep = CacheKeys::SEPARATOR
        )
    }

    /// `<repository>|tdc|<type id>`, both segments percent-encoded. `None` addresses the
    /// repository's unqualified root key.
    pub fn generate_key(repository_id: &str, type_id: Option<&str>) -> String {
        let mut key = Self::prefix(repository_id);
        if let Some(type_id) = type_id {
            key.push_str(&urlencoding::encode(type_id));
        }
        key
    }

    pub fn put(&self, repository_id: &str, definition: &TypeDefinition) {
        if definition.id.is_empty() {
            return;
        }
        let key = Self::generate_key(repository_id, Some(&definition.id));
        let bytes = match serde_json::to_vec(definition) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode type '{}': {}", definition.id, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&key, &bytes, self.ttl) {
            warn!("Failed to cache type '{}': {}", key, e);
            return;
        }
        if let Ok(mut repositories) = self.repositories.lock() {
            repositories.insert(repository_id.to_string());
        }
    }

    pub fn get(&self, repository_id: &str, type_id: &str) -> Option<TypeDefinition> {
        let key = Self::generate_key(repository_id, Some(type_id));
        let bytes = match self.store.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Type cache read of '{}' failed: {}", key, e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(definition) => {
                debug!("Type cache hit for '{}'", key);
                Some(definition)
            }
            Err(e) => {
                warn!("Discarding unreadable type definition '{}': {}", key, e);
                None
            }
        }
    }

    /// Remove one type. Without a type id only the repository's root key is
    /// removed; the repository's other types stay cached.
    pub fn remove(&self, repository_id: &str, type_id: Option<&str>) {
        let key = Self::generate_key(repository_id, type_id);
        if let Err(e) = self.store.delete(&key) {
            warn!("Failed to remove type cache entry '{}': {}", key, e);
        }
    }

    /// Remove every type of `repository_id`, if clearing is allowed.
    pub fn remove_repository(&self, repository_id: &str) {
        if !self.allow_clear {
            debug!("Type cache clear for '{}' skipped", repository_id);
            return;
        }
        let prefix = Self::prefix(repository_id);
        match self.store.delete_prefix(&prefix) {
            Ok(count) => debug!("Removed {} cached types for '{}'", count, repository_id),
            Err(e) => warn!("Failed to clear type cache '{}': {}", prefix, e),
        }
    }

    /// Remove every type this cache wrote, if clearing is allowed.
    pub fn remove_all(&self) {
        if !self.allow_clear {
            debug!("Type cache clear skipped; store may be shared");
            return;
        }
        let repositories = match self.repositories.lock() {
            Ok(mut repositories) => std::mem::take(&mut *repositories),
            Err(_) => return,
        };
        for repository_id in repositories {
            self.remove_repository(&repository_id);
        }
    }
}
