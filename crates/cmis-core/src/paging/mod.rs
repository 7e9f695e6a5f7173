//! Paging engine for listing operations.
//!
//! A [`PageFetcher`] performs one remote listing call for a given skip count.
//! [`PagedCollection`] turns a fetcher into a lazy sequence that is either
//! iterated transparently across pages or viewed one page at a time.

mod collection;
mod fetcher;
mod iterator;

pub use collection::PagedCollection;
pub use fetcher::{ContinuationPageFetcher, FnPageFetcher, Page, PageFetcher};
pub use iterator::{PagedIterator, PagingMode};
