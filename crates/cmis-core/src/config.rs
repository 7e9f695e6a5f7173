//! Session configuration for the CMIS client.
//!
//! Defaults rely exclusively on TTL-based expiry: none of the caches has a
//! count-based limit, so cache size is managed by tuning the TTL values.

use crate::error::{CmisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default values for [`SessionParameters`].
pub struct SessionParameterDefaults;

impl SessionParameterDefaults {
    /// Object snapshots (2 hours).
    pub const CACHE_TTL_OBJECTS: Duration = Duration::from_secs(2 * 60 * 60);
    /// Path-to-id entries (30 minutes).
    pub const CACHE_TTL_PATH_TO_ID: Duration = Duration::from_secs(30 * 60);
    /// Repository infos (24 hours).
    pub const CACHE_TTL_REPOSITORIES: Duration = Duration::from_secs(24 * 60 * 60);
    /// Type definitions (4 hours).
    pub const CACHE_TTL_TYPES: Duration = Duration::from_secs(4 * 60 * 60);
    /// Longest TTL any cache accepts (100 years). Keeps SQLite expiry
    /// timestamps in the four-digit-year range and stays inside mini-moka's
    /// time-to-live limit.
    pub const MAX_CACHE_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);
    /// Page size used by the default operation context.
    pub const MAX_ITEMS_PER_PAGE: u64 = 100;
}

/// Key layout shared by every cache built on a [`crate::store::KeyValueStore`].
///
/// All keys start with the repository id so that one backing store can hold
/// several repositories. Sub-caches add their own namespace tag.
pub struct CacheKeys;

impl CacheKeys {
    /// Separator between key segments.
    pub const SEPARATOR: char = '|';
    /// Object cache namespace.
    pub const OBJECT_NAMESPACE: &'static str = "oc";
    /// Type definition cache namespace.
    pub const TYPE_NAMESPACE: &'static str = "tdc";
}

/// Recognized session options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SessionParameters {
    /// Repository the session is bound to.
    pub repository_id: Option<String>,
    /// TTL of object variant maps, in seconds.
    pub cache_ttl_objects_seconds: u64,
    /// TTL of path-to-id entries, in seconds.
    pub cache_ttl_path_to_id_seconds: u64,
    /// TTL of repository info records, in seconds.
    pub cache_ttl_repositories_seconds: u64,
    /// TTL of type definition records, in seconds.
    pub cache_ttl_types_seconds: u64,
    /// Page size of the default operation context.
    pub max_items_per_page: u64,
    /// Skip the path index on path lookups (id lookups are unaffected).
    pub cache_path_omit: bool,
    /// Allow clear operations to delete entries from the backing store.
    ///
    /// Off by default: the store may be shared with unrelated data.
    pub allow_cache_clear: bool,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            repository_id: None,
            cache_ttl_objects_seconds: SessionParameterDefaults::CACHE_TTL_OBJECTS.as_secs(),
            cache_ttl_path_to_id_seconds: SessionParameterDefaults::CACHE_TTL_PATH_TO_ID
                .as_secs(),
            cache_ttl_repositories_seconds: SessionParameterDefaults::CACHE_TTL_REPOSITORIES
                .as_secs(),
            cache_ttl_types_seconds: SessionParameterDefaults::CACHE_TTL_TYPES.as_secs(),
            max_items_per_page: SessionParameterDefaults::MAX_ITEMS_PER_PAGE,
            cache_path_omit: false,
            allow_cache_clear: false,
        }
    }
}

impl SessionParameters {
    /// Parameters for the given repository with every other option defaulted.
    pub fn for_repository(repository_id: impl Into<String>) -> Self {
        Self {
            repository_id: Some(repository_id.into()),
            ..Self::default()
        }
    }

    /// Parse parameters from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: SessionParameters = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Read parameters from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CmisError::Io {
            message: format!("Failed to read session parameters {}: {}", path.display(), e),
            source: Some(e),
        })?;
        Self::from_json_str(&contents)
    }

    /// Reject values the caches cannot work with.
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = &self.repository_id {
            if id.is_empty() {
                return Err(CmisError::invalid_argument("Repository ID must not be empty."));
            }
        }
        let max = SessionParameterDefaults::MAX_CACHE_TTL.as_secs();
        for (name, seconds) in [
            ("cache_ttl_objects_seconds", self.cache_ttl_objects_seconds),
            ("cache_ttl_path_to_id_seconds", self.cache_ttl_path_to_id_seconds),
            ("cache_ttl_repositories_seconds", self.cache_ttl_repositories_seconds),
            ("cache_ttl_types_seconds", self.cache_ttl_types_seconds),
        ] {
            if seconds > max {
                return Err(CmisError::invalid_argument(format!(
                    "{} must not exceed {} seconds.",
                    name, max
                )));
            }
        }
        if self.max_items_per_page == 0 {
            return Err(CmisError::invalid_argument(
                "max_items_per_page must be greater than zero.",
            ));
        }
        Ok(())
    }

    pub fn object_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_objects_seconds)
    }

    pub fn path_to_id_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_path_to_id_seconds)
    }

    pub fn repository_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_repositories_seconds)
    }

    pub fn type_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_types_seconds)
    }

    /// Longest TTL of any cache; in-memory stores size their expiry window on it.
    pub fn longest_ttl(&self) -> Duration {
        [
            self.object_ttl(),
            self.path_to_id_ttl(),
            self.repository_ttl(),
            self.type_ttl(),
        ]
        .into_iter()
        .max()
        .unwrap_or(SessionParameterDefaults::CACHE_TTL_REPOSITORIES)
    }
}
