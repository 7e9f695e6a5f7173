//! Multi-variant object cache with a secondary path index.

use crate::config::{CacheKeys, SessionParameters};
use crate::models::CmisObject;
use crate::session::SessionLink;
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What the object cache needs to know about a cached entity.
pub trait CacheableObject: Serialize + DeserializeOwned {
    /// Stable identity. Entities with an empty id are never cached.
    fn cache_id(&self) -> &str;

    /// Hierarchical path, when the entity has one.
    fn cache_path(&self) -> Option<&str>;

    /// Rebind the entity to the session reading it from the cache.
    fn refresh_session(&mut self, link: &SessionLink);
}

impl CacheableObject for CmisObject {
    fn cache_id(&self) -> &str {
        self.id()
    }

    fn cache_path(&self) -> Option<&str> {
        self.path()
    }

    fn refresh_session(&mut self, link: &SessionLink) {
        CmisObject::refresh_session(self, link);
    }
}

/// All cached variants of one object, keyed by operation-context cache key.
///
/// Each variant is kept as its own JSON value so that a payload which no
/// longer decodes only loses that variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantMap {
    variants: BTreeMap<String, Value>,
}

impl VariantMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn contains(&self, cache_key: &str) -> bool {
        self.variants.contains_key(cache_key)
    }

    pub fn cache_keys(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Store `object` as the variant for `cache_key`, replacing only that
    /// variant.
    pub fn insert<O: Serialize>(&mut self, cache_key: &str, object: &O) -> crate::Result<()> {
        let value = serde_json::to_value(object)?;
        self.variants.insert(cache_key.to_string(), value);
        Ok(())
    }

    /// Decode the variant for `cache_key`. An undecodable payload is logged
    /// and reported as absent.
    pub fn get<O: DeserializeOwned>(&self, cache_key: &str) -> Option<O> {
        let value = self.variants.get(cache_key)?;
        match O::deserialize(value) {
            Ok(object) => Some(object),
            Err(e) => {
                warn!("Dropping unreadable cache variant '{}': {}", cache_key, e);
                None
            }
        }
    }

    /// Remove every variant that does not decode as `O`. Returns how many
    /// were dropped.
    pub fn retain_readable<O: DeserializeOwned>(&mut self) -> usize {
        let before = self.variants.len();
        self.variants.retain(|cache_key, value| match O::deserialize(&*value) {
            Ok(_) => true,
            Err(e) => {
                warn!("Dropping unreadable cache variant '{}': {}", cache_key, e);
                false
            }
        });
        before - self.variants.len()
    }
}

/// Id- and path-indexed object cache scoped to one repository.
///
/// Entries are written to a [`KeyValueStore`] that may be shared with other
/// sessions and repositories. Store faults are logged and treated as misses;
/// no cache operation ever fails.
///
/// There is no locking around check-then-read or read-modify-write
/// sequences. Concurrent writers to the same id race and the last write
/// wins; readers must tolerate spurious misses.
pub struct ObjectCache<O = CmisObject> {
    store: Arc<dyn KeyValueStore>,
    repository_id: String,
    object_ttl: Duration,
    path_ttl: Duration,
    allow_clear: bool,
    session: Option<SessionLink>,
    _marker: PhantomData<fn() -> O>,
}

impl<O: CacheableObject> ObjectCache<O> {
    /// Capacity reported by [`cache_size`](Self::cache_size). Size is only
    /// bounded by entry expiry.
    pub const UNBOUNDED: usize = usize::MAX;

    pub fn new(
        store: Arc<dyn KeyValueStore>,
        repository_id: impl Into<String>,
        params: &SessionParameters,
    ) -> Self {
        Self {
            store,
            repository_id: repository_id.into(),
            object_ttl: params.object_ttl(),
            path_ttl: params.path_to_id_ttl(),
            allow_clear: params.allow_cache_clear,
            session: None,
            _marker: PhantomData,
        }
    }

    /// Reattach every cache hit to `link` before returning it.
    pub fn attached_to(mut self, link: SessionLink) -> Self {
        self.session = Some(link);
        self
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    /// `<repository>|oc|<id or path>`, both segments percent-encoded.
    pub fn generate_key(&self, id_or_path: &str) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            urlencoding::encode(&self.repository_id),
            CacheKeys::OBJECT_NAMESPACE,
            urlencoding::encode(id_or_path),
            sep = CacheKeys::SEPARATOR,
        )
    }

    fn store_has(&self, key: &str) -> bool {
        match self.store.has(key) {
            Ok(found) => found,
            Err(e) => {
                warn!("Object cache lookup of '{}' failed: {}", key, e);
                false
            }
        }
    }

    fn store_get(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Object cache read of '{}' failed: {}", key, e);
                None
            }
        }
    }

    fn store_set(&self, key: &str, bytes: &[u8], ttl: Duration) {
        if let Err(e) = self.store.set(key, bytes, ttl) {
            warn!("Object cache write of '{}' failed: {}", key, e);
        }
    }

    fn store_delete(&self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            warn!("Object cache delete of '{}' failed: {}", key, e);
        }
    }

    fn read_variants(&self, key: &str) -> Option<VariantMap> {
        let bytes = self.store_get(key)?;
        match VariantMap::from_bytes(&bytes) {
            Ok(variants) => Some(variants),
            Err(e) => {
                warn!("Discarding unreadable variant map '{}': {}", key, e);
                None
            }
        }
    }

    fn write_path(&self, path: &str, object_id: &str) {
        match serde_json::to_vec(object_id) {
            Ok(bytes) => self.store_set(&self.generate_key(path), &bytes, self.path_ttl),
            Err(e) => warn!("Failed to encode path entry '{}': {}", path, e),
        }
    }

    /// Whether any variant of `object_id` is cached. `_cache_key` is not
    /// consulted; [`get_by_id`](Self::get_by_id) resolves the exact variant.
    pub fn contains_id(&self, object_id: &str, _cache_key: &str) -> bool {
        self.store_has(&self.generate_key(object_id))
    }

    /// Whether a path-to-id entry exists for `path`.
    pub fn contains_path(&self, path: &str, _cache_key: &str) -> bool {
        self.store_has(&self.generate_key(path))
    }

    /// Cache `object` as the `cache_key` variant, leaving other variants of
    /// the same id untouched. Objects that report a path are also indexed
    /// by it.
    pub fn put(&self, object: &O, cache_key: &str) {
        let object_id = object.cache_id();
        if object_id.is_empty() || cache_key.is_empty() {
            debug!("Not caching object with empty id or cache key");
            return;
        }

        let key = self.generate_key(object_id);
        let mut variants = self.read_variants(&key).unwrap_or_default();
        variants.retain_readable::<O>();

        if let Err(e) = variants.insert(cache_key, object) {
            warn!("Failed to encode object '{}' for caching: {}", object_id, e);
            return;
        }
        match variants.to_bytes() {
            Ok(bytes) => self.store_set(&key, &bytes, self.object_ttl),
            Err(e) => {
                warn!("Failed to encode variant map '{}': {}", key, e);
                return;
            }
        }

        if let Some(path) = object.cache_path().filter(|p| !p.is_empty()) {
            self.write_path(path, object_id);
        }
    }

    /// Cache `object` and index it under `path`, whether or not the object
    /// reports that path itself.
    pub fn put_path(&self, path: &str, object: &O, cache_key: &str) {
        if path.is_empty() {
            return;
        }
        self.put(object, cache_key);

        let object_id = object.cache_id();
        if !object_id.is_empty() {
            self.write_path(path, object_id);
        }
    }

    /// Cached `cache_key` variant of `object_id`, reattached to the owning
    /// session.
    pub fn get_by_id(&self, object_id: &str, cache_key: &str) -> Option<O> {
        if !self.contains_id(object_id, cache_key) {
            return None;
        }

        let variants = self.read_variants(&self.generate_key(object_id))?;
        let mut object: O = variants.get(cache_key)?;
        if let Some(link) = &self.session {
            object.refresh_session(link);
        }
        debug!("Object cache hit for '{}'", object_id);
        Some(object)
    }

    /// Cached variant of the object at `path`. A path whose object is gone
    /// is removed from the index.
    pub fn get_by_path(&self, path: &str, cache_key: &str) -> Option<O> {
        if !self.contains_path(path, cache_key) {
            return None;
        }

        let object_id = self.get_object_id_by_path(path)?;
        let object = self.get_by_id(&object_id, cache_key);
        if object.is_none() {
            debug!("Removing stale path entry '{}' -> '{}'", path, object_id);
            self.remove_path(path);
        }
        object
    }

    /// Id indexed under `path`, independent of any variant.
    pub fn get_object_id_by_path(&self, path: &str) -> Option<String> {
        let bytes = self.store_get(&self.generate_key(path))?;
        match serde_json::from_slice::<String>(&bytes) {
            Ok(object_id) => Some(object_id),
            Err(e) => {
                warn!("Discarding unreadable path entry '{}': {}", path, e);
                None
            }
        }
    }

    /// Drop every variant of `object_id`. Path entries pointing at it are
    /// left to heal on their next lookup.
    pub fn remove(&self, object_id: &str) {
        if object_id.is_empty() {
            return;
        }
        self.store_delete(&self.generate_key(object_id));
    }

    /// Drop the path entry only.
    pub fn remove_path(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        self.store_delete(&self.generate_key(path));
    }

    /// No-op unless the deployment allows clearing; then removes every
    /// object and path entry of this repository.
    pub fn clear(&self) {
        if !self.allow_clear {
            debug!("Object cache clear skipped; store may be shared");
            return;
        }
        let prefix = self.generate_key("");
        match self.store.delete_prefix(&prefix) {
            Ok(count) => debug!("Cleared {} object cache entries for '{}'", count, prefix),
            Err(e) => warn!("Failed to clear object cache '{}': {}", prefix, e),
        }
    }

    pub fn cache_size(&self) -> usize {
        Self::UNBOUNDED
    }
}
