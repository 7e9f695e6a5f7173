//! Pages and the fetchers that produce them.

use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// One batch of results from a listing call. Never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total across all pages; `None` when the repository did not report it.
    pub total_num_items: Option<u64>,
    pub has_more_items: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_num_items: Option<u64>, has_more_items: bool) -> Self {
        Self {
            items,
            total_num_items,
            has_more_items,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Some(0), false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Convert every item, keeping the page metadata.
    pub fn try_map<U>(self, f: impl FnMut(T) -> Result<U>) -> Result<Page<U>> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<Vec<_>>>()?,
            total_num_items: self.total_num_items,
            has_more_items: self.has_more_items,
        })
    }
}

/// One remote listing call, bound to everything but the skip count.
///
/// Fetchers never retry and never touch the caches; errors from the remote
/// call propagate unchanged.
pub trait PageFetcher<T>: Send + Sync {
    /// Fetch the page starting at `skip_count`.
    fn fetch_page(&self, skip_count: u64) -> Result<Page<T>>;

    /// Page-size hint passed to the remote call.
    fn max_num_items(&self) -> u64;

    /// Override the page-size hint before the next fetch.
    fn set_max_num_items(&self, max_num_items: u64);
}

/// [`PageFetcher`] backed by a closure taking `(skip_count, max_num_items)`.
pub struct FnPageFetcher<F> {
    max_num_items: AtomicU64,
    fetch: F,
}

impl<F> FnPageFetcher<F> {
    pub fn new<T>(max_num_items: u64, fetch: F) -> Self
    where
        F: Fn(u64, u64) -> Result<Page<T>> + Send + Sync,
    {
        Self {
            max_num_items: AtomicU64::new(max_num_items.max(1)),
            fetch,
        }
    }
}

impl<T, F> PageFetcher<T> for FnPageFetcher<F>
where
    F: Fn(u64, u64) -> Result<Page<T>> + Send + Sync,
{
    fn fetch_page(&self, skip_count: u64) -> Result<Page<T>> {
        let max = self.max_num_items();
        debug!("Fetching page at skip {} (max {})", skip_count, max);
        (self.fetch)(skip_count, max)
    }

    fn max_num_items(&self) -> u64 {
        self.max_num_items.load(Ordering::Relaxed)
    }

    fn set_max_num_items(&self, max_num_items: u64) {
        self.max_num_items
            .store(max_num_items.max(1), Ordering::Relaxed);
    }
}

/// Fetcher for token-continued listings such as the change log.
///
/// The closure takes `(token, max_num_items)` and returns the page plus the
/// token to continue from. A continuation page repeats the previous page's
/// last entry, so every page fetched past skip 0 loses its first item.
///
/// Tokens are recorded per skip count, so any number of cursors can walk the
/// same listing independently. A skip count that no cursor has reached yet is
/// reached by walking forward from the nearest recorded one.
pub struct ContinuationPageFetcher<F> {
    max_num_items: AtomicU64,
    tokens: Mutex<BTreeMap<u64, Option<String>>>,
    fetch: F,
}

impl<F> ContinuationPageFetcher<F> {
    pub fn new<T>(initial_token: Option<String>, max_num_items: u64, fetch: F) -> Self
    where
        F: Fn(Option<&str>, u64) -> Result<(Page<T>, Option<String>)> + Send + Sync,
    {
        Self {
            max_num_items: AtomicU64::new(max_num_items.max(1)),
            tokens: Mutex::new(BTreeMap::from([(0, initial_token)])),
            fetch,
        }
    }

    fn tokens(&self) -> MutexGuard<'_, BTreeMap<u64, Option<String>>> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Nearest recorded position at or before `skip_count`, with its token.
    fn nearest(&self, skip_count: u64) -> (u64, Option<String>) {
        self.tokens()
            .range(..=skip_count)
            .next_back()
            .map(|(position, token)| (*position, token.clone()))
            .unwrap_or((0, None))
    }
}

impl<T, F> PageFetcher<T> for ContinuationPageFetcher<F>
where
    F: Fn(Option<&str>, u64) -> Result<(Page<T>, Option<String>)> + Send + Sync,
{
    fn fetch_page(&self, skip_count: u64) -> Result<Page<T>> {
        loop {
            let (position, token) = self.nearest(skip_count);
            let max = self.max_num_items();
            debug!(
                "Fetching continuation page at skip {} (token {:?}, max {})",
                position, token, max
            );
            let (mut page, next) = (self.fetch)(token.as_deref(), max)?;
            if position > 0 && !page.items.is_empty() {
                page.items.remove(0);
            }

            let end = position + page.len() as u64;
            if end > position {
                self.tokens().insert(end, next.or(token));
            }

            if end > skip_count {
                let offset = (skip_count - position) as usize;
                page.items.drain(..offset);
                return Ok(page);
            }
            if end == position || !page.has_more_items {
                return Ok(Page::new(Vec::new(), page.total_num_items, false));
            }
        }
    }

    fn max_num_items(&self) -> u64 {
        self.max_num_items.load(Ordering::Relaxed)
    }

    fn set_max_num_items(&self, max_num_items: u64) {
        self.max_num_items
            .store(max_num_items.max(1), Ordering::Relaxed);
    }
}
