//! Expiring key-value stores backing the CMIS caches.
//!
//! Provides:
//! - [`KeyValueStore`], the contract every cache is written against
//! - [`MemoryStore`], an in-process store for a single process
//! - [`SqliteStore`], a persistent store that can be shared between processes
//!
//! A store may be shared by many sessions and repositories; the caches keep
//! their entries apart through key prefixes.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{KeyValueStore, StoreStats};
