//! Fan-out of several page requests into one deduplicated batch.

use crate::api::RemoteSource;
use crate::dedup::uniq_by_key;
use crate::error::RetryExhausted;
use crate::retry::RetryingFetcher;
use crate::types::RecommendationItem;
use futures::future::try_join_all;
use log::debug;

/// Page counter shared by every acquisition within one browsing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    pub fn new() -> Self {
        Self { page: 1 }
    }

    /// Page the next request will ask for.
    pub fn current(&self) -> u32 {
        self.page
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Hand out the next `n` pages and advance past them.
    pub fn take(&mut self, n: usize) -> Vec<u32> {
        let pages: Vec<u32> = (0..n as u32).map(|i| self.page + i).collect();
        self.page += n as u32;
        pages
    }
}

/// How the requests of one batch are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// All requests in flight at once. Fast, but the feed has no
    /// coordination between them and returns more duplicates.
    Parallel,
    /// One request after another.
    #[default]
    Sequential,
}

impl FetchMode {
    pub fn from_parallel_flag(parallel: bool) -> Self {
        if parallel {
            FetchMode::Parallel
        } else {
            FetchMode::Sequential
        }
    }
}

pub struct BatchAcquirer<S> {
    fetcher: RetryingFetcher<S>,
    mode: FetchMode,
}

impl<S: RemoteSource> BatchAcquirer<S> {
    pub fn new(fetcher: RetryingFetcher<S>, mode: FetchMode) -> Self {
        Self { fetcher, mode }
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Issue `n` page requests and return their items in request order,
    /// deduplicated by key, each stamped with a fresh render id.
    ///
    /// Any request that exhausts its retries fails the whole batch.
    pub async fn acquire(
        &self,
        n: usize,
        cursor: &mut PageCursor,
    ) -> Result<Vec<RecommendationItem>, RetryExhausted> {
        let pages = cursor.take(n);

        let raw = match self.mode {
            FetchMode::Parallel => {
                // try_join_all yields results in input order
                let results = try_join_all(pages.iter().map(|&p| self.fetcher.fetch(p))).await?;
                results.into_iter().flatten().collect()
            }
            FetchMode::Sequential => {
                let mut all = Vec::new();
                for &page in &pages {
                    all.extend(self.fetcher.fetch(page).await?);
                }
                all
            }
        };

        let fetched = raw.len();
        let unique = uniq_by_key(raw);
        debug!(
            "Acquired pages {:?} ({:?}): {} items, {} unique",
            pages,
            self.mode,
            fetched,
            unique.len()
        );

        Ok(unique.into_iter().map(RecommendationItem::from_raw).collect())
    }
}
