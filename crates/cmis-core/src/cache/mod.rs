//! Session and binding caches.
//!
//! Every cache here is written against a [`KeyValueStore`](crate::store::KeyValueStore)
//! and treats store faults as misses. Nothing in this module returns an
//! error: the caches only ever make lookups cheaper.

mod object;
mod repository_info;
mod type_definition;

pub use object::{CacheableObject, ObjectCache, VariantMap};
pub use repository_info::RepositoryInfoCache;
pub use type_definition::TypeDefinitionCache;
