//! CMIS client core - session caching and paged retrieval for CMIS repositories.
//!
//! This crate sits between an application and a CMIS service binding. It
//! answers object, type-definition and repository-info reads from expiring
//! caches where possible, and exposes every remote listing as a lazily
//! fetched [`PagedCollection`]. The wire protocol is supplied by the caller
//! through the service traits in [`binding`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cmis_client::{Binding, Session, SessionParameters};
//!
//! fn main() -> cmis_client::Result<()> {
//!     let session = Session::builder(SessionParameters::for_repository("A1"))
//!         .with_binding(Binding::from_service(my_browser_binding()))
//!         .build()?;
//!
//!     let ctx = session.create_operation_context();
//!     let root = session.get_root_folder(&ctx)?;
//!
//!     // Children are fetched page by page while iterating
//!     for child in session.get_children(root.id(), &ctx)? {
//!         println!("{}", child?.name().unwrap_or_default());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod models;
pub mod paging;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use binding::{Binding, CachingRepositoryService, CmisBinding};
pub use cache::{CacheableObject, ObjectCache, RepositoryInfoCache, TypeDefinitionCache, VariantMap};
pub use config::{CacheKeys, SessionParameterDefaults, SessionParameters};
pub use error::{CmisError, Result};
pub use factory::{DefaultObjectFactory, ObjectFactory};
pub use models::{
    BaseTypeId, ChangeEvent, CmisObject, OperationContext, PropertyIds, QueryResult,
    RepositoryInfo, TypeDefinition,
};
pub use paging::{Page, PageFetcher, PagedCollection, PagedIterator};
pub use session::{Session, SessionBuilder, SessionFactory, SessionLink};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreStats};
