//! Forward-only cursor over fetched pages.

use super::fetcher::{Page, PageFetcher};
use crate::error::Result;
use std::sync::Arc;

/// Whether a cursor crosses page boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// Fetch the next page when the current one is exhausted.
    Continuous,
    /// Stop at the end of the first fetched page.
    SinglePage,
}

/// Cursor state over a [`PageFetcher`].
///
/// `skip_count` is the absolute offset of the current page and `skip_offset`
/// the position inside it, always within `0..=page.len()`. No request is made
/// until the cursor is first read. Moving past the end of a page is lazy:
/// advancing only bumps the offset and the next read fetches at
/// `skip_count + skip_offset`.
///
/// The cursor cannot be rewound; build a new collection with `skip_to`
/// instead. As an [`Iterator`] it yields `Err` once for a failed fetch and
/// then ends.
pub struct PagedIterator<T> {
    fetcher: Arc<dyn PageFetcher<T>>,
    mode: PagingMode,
    skip_count: u64,
    skip_offset: usize,
    page: Option<Page<T>>,
    failed: bool,
}

impl<T> PagedIterator<T> {
    pub fn new(skip_count: u64, fetcher: Arc<dyn PageFetcher<T>>, mode: PagingMode) -> Self {
        Self {
            fetcher,
            mode,
            skip_count,
            skip_offset: 0,
            page: None,
            failed: false,
        }
    }

    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    /// Absolute position of the cursor.
    pub fn position(&self) -> u64 {
        self.skip_count + self.skip_offset as u64
    }

    fn current_page(&mut self) -> Result<&Page<T>> {
        let page = match self.page.take() {
            Some(page) => page,
            None => self.fetcher.fetch_page(self.skip_count)?,
        };
        Ok(self.page.insert(page))
    }

    fn increment_page(&mut self) -> Result<()> {
        self.skip_count += self.skip_offset as u64;
        self.skip_offset = 0;
        self.page = None;
        self.current_page()?;
        Ok(())
    }

    /// Number of items in the current page.
    pub fn page_num_items(&mut self) -> Result<usize> {
        Ok(self.current_page()?.len())
    }

    /// Total reported with the current page, if any.
    pub fn total_num_items(&mut self) -> Result<Option<u64>> {
        Ok(self.current_page()?.total_num_items)
    }

    /// Has-more flag of the current page.
    pub fn has_more_items(&mut self) -> Result<bool> {
        Ok(self.current_page()?.has_more_items)
    }

    /// Whether [`current`](Self::current) would yield an item.
    ///
    /// In continuous mode a cursor at the end of a page stays valid while the
    /// repository reports more items: up to the reported total, or without
    /// limit when no total is known. The next read settles it.
    pub fn is_valid(&mut self) -> Result<bool> {
        let mode = self.mode;
        let skip_count = self.skip_count;
        let skip_offset = self.skip_offset;
        let page = self.current_page()?;

        if mode == PagingMode::SinglePage {
            return Ok(skip_offset < page.len());
        }
        if page.is_empty() {
            return Ok(false);
        }
        if skip_offset < page.len() {
            return Ok(true);
        }
        if !page.has_more_items {
            return Ok(false);
        }
        match page.total_num_items {
            None => Ok(true),
            Some(total) => Ok(skip_count + (skip_offset as u64) < total),
        }
    }

    /// Item under the cursor, fetching the next page first when the cursor
    /// sits at the end of the current one in continuous mode.
    pub fn current(&mut self) -> Result<Option<&T>> {
        let len = self.current_page()?.len();
        if len == 0 {
            return Ok(None);
        }
        if self.skip_offset == len && self.mode == PagingMode::Continuous {
            self.increment_page()?;
        }

        let offset = self.skip_offset;
        Ok(self.current_page()?.items.get(offset))
    }

    /// Move to the next position. Never fetches.
    ///
    /// Only meaningful after [`current`](Self::current) returned an item. The
    /// offset never moves past the end of a loaded page.
    pub(crate) fn advance(&mut self) {
        match &self.page {
            Some(page) if self.skip_offset >= page.len() => {}
            _ => self.skip_offset += 1,
        }
    }
}

impl<T: Clone> Iterator for PagedIterator<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let step = match self.is_valid() {
            Ok(false) => Ok(None),
            Ok(true) => self.current().map(|item| item.cloned()),
            Err(e) => Err(e),
        };

        match step {
            Ok(Some(item)) => {
                self.advance();
                Some(Ok(item))
            }
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
