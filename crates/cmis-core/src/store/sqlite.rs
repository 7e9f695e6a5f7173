//! Persistent store on a single SQLite file.

use super::traits::{KeyValueStore, StoreStats};
use crate::config::SessionParameterDefaults;
use crate::error::{CmisError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Store whose entries outlive the process.
///
/// Rows are partitioned by namespace, so unrelated deployments can point at
/// one database file without seeing each other's keys. All access goes
/// through one connection behind a mutex.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    namespace: String,
}

impl SqliteStore {
    /// Default namespace for CMIS caches.
    pub const DEFAULT_NAMESPACE: &'static str = "cmis";

    /// Open the database at `db_path`, creating it and its directory if missing.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_namespace(db_path, Self::DEFAULT_NAMESPACE)
    }

    /// Like [`new`](Self::new), reading and writing only `namespace`.
    pub fn with_namespace(db_path: impl AsRef<Path>, namespace: impl Into<String>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CmisError::Io {
                message: format!("Cannot create store directory {}: {}", parent.display(), e),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| CmisError::Database {
            message: format!("Cannot open store database: {}", e),
            source: Some(e),
        })?;

        // Several sessions may share the file
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| CmisError::Database {
                message: format!("Cannot configure store database: {}", e),
                source: Some(e),
            })?;

        Self::from_connection(conn, namespace.into())
    }

    /// Create a private store in memory. Mostly useful for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| CmisError::Database {
            message: format!("Cannot open in-memory store: {}", e),
            source: Some(e),
        })?;
        Self::from_connection(conn, Self::DEFAULT_NAMESPACE.to_string())
    }

    fn from_connection(conn: Connection, namespace: String) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            namespace,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Namespace this store reads and writes.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| CmisError::Database {
            message: format!("Store connection poisoned: {}", e),
            source: None,
        })
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS store_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value BLOB NOT NULL,
                written_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                byte_len INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            CREATE INDEX IF NOT EXISTS idx_store_entries_expiry
                ON store_entries(namespace, expires_at);
            "#,
        )
        .map_err(|e| CmisError::Database {
            message: format!("Cannot create store schema: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }

    /// Write `value` to expire at an absolute time rather than after a TTL.
    pub fn set_with_expiry(&self, key: &str, value: &[u8], expires_at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO store_entries
                (namespace, key, value, written_at, expires_at, byte_len)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                self.namespace,
                key,
                value,
                timestamp(Utc::now()),
                timestamp(expires_at),
                value.len() as i64
            ],
        )
        .map_err(|e| CmisError::Database {
            message: format!("Cannot write store entry '{}': {}", key, e),
            source: Some(e),
        })?;

        Ok(())
    }

    /// Delete this namespace's expired rows and return how many went.
    ///
    /// Expired rows are never served; this only reclaims their space.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());

        let deleted = conn
            .execute(
                "DELETE FROM store_entries WHERE namespace = ?1 AND expires_at <= ?2",
                params![self.namespace, now],
            )
            .map_err(|e| CmisError::Database {
                message: format!("Cannot purge expired store entries: {}", e),
                source: Some(e),
            })?;

        if deleted > 0 {
            debug!("Purged {} expired entries from '{}'", deleted, self.namespace);
        }

        Ok(deleted)
    }
}

/// Fixed-width timestamps so that string comparison in SQL orders by time.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escape `LIKE` wildcards so a key prefix matches literally.
fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl KeyValueStore for SqliteStore {
    fn has(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());

        conn.query_row(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM store_entries
                WHERE namespace = ?1 AND key = ?2 AND expires_at > ?3
            )
            "#,
            params![self.namespace, key, now],
            |row| row.get(0),
        )
        .map_err(|e| CmisError::Database {
            message: format!("Cannot check store entry '{}': {}", key, e),
            source: Some(e),
        })
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());

        conn.query_row(
            r#"
            SELECT value FROM store_entries
            WHERE namespace = ?1 AND key = ?2 AND expires_at > ?3
            "#,
            params![self.namespace, key, now],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| CmisError::Database {
            message: format!("Cannot read store entry '{}': {}", key, e),
            source: Some(e),
        })
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl.min(SessionParameterDefaults::MAX_CACHE_TTL)).unwrap_or_default();
        let expires_at = Utc::now() + ttl;
        self.set_with_expiry(key, value, expires_at)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM store_entries WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
            )
            .map_err(|e| CmisError::Database {
                message: format!("Cannot delete store entry '{}': {}", key, e),
                source: Some(e),
            })?;

        Ok(deleted > 0)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM store_entries WHERE namespace = ?1 AND key LIKE ?2 ESCAPE '\\'",
                params![self.namespace, like_prefix_pattern(prefix)],
            )
            .map_err(|e| CmisError::Database {
                message: format!("Cannot delete store entries under '{}': {}", prefix, e),
                source: Some(e),
            })?;

        debug!(
            "Deleted {} entries with prefix '{}' from namespace '{}'",
            deleted, prefix, self.namespace
        );

        Ok(deleted)
    }

    fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());

        let (entries, bytes): (i64, i64) = conn
            .query_row(
                r#"
                SELECT COUNT(*), COALESCE(SUM(byte_len), 0)
                FROM store_entries
                WHERE namespace = ?1 AND expires_at > ?2
                "#,
                params![self.namespace, now],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| CmisError::Database {
                message: format!("Cannot read store stats: {}", e),
                source: Some(e),
            })?;

        Ok(StoreStats {
            entry_count: entries as usize,
            total_size_bytes: bytes as u64,
        })
    }
}
