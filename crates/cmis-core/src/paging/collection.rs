//! Lazily fetched listing results.

use super::fetcher::PageFetcher;
use super::iterator::{PagedIterator, PagingMode};
use crate::error::Result;
use std::sync::Arc;

/// Result of a listing operation. Building one performs no I/O; pages are
/// fetched as the collection is iterated or its metadata is read.
///
/// A collection is either continuous, iterating across page boundaries
/// until the repository runs out of items, or a single page view obtained
/// from [`get_page`](Self::get_page).
///
/// ```ignore
/// let mut children = session.get_children(folder_id, &ctx)?;
/// let total = children.total_num_items()?;
/// for child in children {
///     let child = child?;
/// }
/// ```
pub struct PagedCollection<T> {
    skip_count: u64,
    fetcher: Arc<dyn PageFetcher<T>>,
    mode: PagingMode,
    iterator: Option<PagedIterator<T>>,
}

impl<T> std::fmt::Debug for PagedCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedCollection")
            .field("skip_count", &self.skip_count)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<T> PagedCollection<T> {
    /// Continuous collection starting at `skip_count`.
    pub fn new(skip_count: u64, fetcher: Arc<dyn PageFetcher<T>>) -> Self {
        Self::with_mode(skip_count, fetcher, PagingMode::Continuous)
    }

    fn with_mode(skip_count: u64, fetcher: Arc<dyn PageFetcher<T>>, mode: PagingMode) -> Self {
        Self {
            skip_count,
            fetcher,
            mode,
            iterator: None,
        }
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    /// Fresh view of the same listing starting at `position`. A single page
    /// view stays a single page view.
    pub fn skip_to(&self, position: u64) -> Self {
        Self::with_mode(position, self.fetcher.clone(), self.mode)
    }

    /// Single page view at this collection's offset. `max_num_items`
    /// replaces the page-size hint of the shared fetcher.
    pub fn get_page(&self, max_num_items: Option<u64>) -> Self {
        if let Some(max) = max_num_items.filter(|max| *max > 0) {
            self.fetcher.set_max_num_items(max);
        }
        Self::with_mode(self.skip_count, self.fetcher.clone(), PagingMode::SinglePage)
    }

    /// The cursor backing metadata reads. Created on first use and reused
    /// when the collection is iterated.
    pub fn iter_mut(&mut self) -> &mut PagedIterator<T> {
        let (skip_count, mode) = (self.skip_count, self.mode);
        let fetcher = &self.fetcher;
        self.iterator
            .get_or_insert_with(|| PagedIterator::new(skip_count, fetcher.clone(), mode))
    }

    pub fn page_num_items(&mut self) -> Result<usize> {
        self.iter_mut().page_num_items()
    }

    pub fn has_more_items(&mut self) -> Result<bool> {
        self.iter_mut().has_more_items()
    }

    /// Total number of items, when the repository reports it.
    pub fn total_num_items(&mut self) -> Result<Option<u64>> {
        self.iter_mut().total_num_items()
    }
}

impl<T: Clone> IntoIterator for PagedCollection<T> {
    type Item = Result<T>;
    type IntoIter = PagedIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        match self.iterator {
            Some(iterator) => iterator,
            None => PagedIterator::new(self.skip_count, self.fetcher, self.mode),
        }
    }
}
