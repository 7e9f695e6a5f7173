//! Data models for the CMIS client.
//!
//! Domain records ([`CmisObject`], [`RepositoryInfo`], [`TypeDefinition`],
//! [`QueryResult`], [`ChangeEvent`]), the [`OperationContext`] that shapes
//! reads, and the raw records the binding layer hands back.

mod context;
mod data;
mod object;
mod repository;
mod results;

pub use context::*;
pub use data::*;
pub use object::*;
pub use repository::*;
pub use results::*;
