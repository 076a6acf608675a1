//! Pagination state machine driving refresh and infinite scroll.

use crate::api::RemoteSource;
use crate::batch::{BatchAcquirer, FetchMode, PageCursor};
use crate::config::Config;
use crate::dedup::merge;
use crate::error::{FeedError, Result, RetryExhausted};
use crate::filter::{self, FilterConfig};
use crate::focus::ActiveIndexController;
use crate::notify::Notifier;
use crate::types::RecommendationItem;
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Refreshing,
    FetchingMore,
}

/// What a refresh or fetch-more call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The controller was busy; nothing happened.
    Skipped,
    /// The target count was reached.
    Completed { added: usize, iterations: usize },
    /// Gave up after the maximum number of rounds. Whatever was gathered
    /// is kept.
    IterationBoundExceeded {
        added: usize,
        iterations: usize,
        target: usize,
    },
}

/// Smallest item count that spills at least one item past the last
/// complete row: `ceil(len / columns) * columns + 1`.
///
/// # Examples
///
/// ```
/// use rec_grid::feed::least_required_count;
///
/// assert_eq!(least_required_count(20, 6), 25);
/// assert_eq!(least_required_count(24, 6), 25);
/// assert_eq!(least_required_count(0, 6), 1);
/// ```
pub fn least_required_count(len: usize, columns: usize) -> usize {
    let columns = columns.max(1);
    len.div_ceil(columns) * columns + 1
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// Pages requested per acquisition round.
    pub batch_pages: usize,
    /// Rounds allowed within one refresh or fetch-more.
    pub max_iterations: usize,
    pub filter: FilterConfig,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for FeedSettings {
    fn from(config: &Config) -> Self {
        Self {
            batch_pages: config.pagination.batch_pages.max(1),
            max_iterations: config.pagination.max_fetch_iterations.max(1),
            filter: config.filter.clone(),
        }
    }
}

/// Owns the visible collection, the page cursor and the focus state.
///
/// Calls are rejected as [`FetchOutcome::Skipped`] when the controller is
/// not in a compatible state.
pub struct PaginationController<S> {
    acquirer: BatchAcquirer<S>,
    notifier: Arc<dyn Notifier>,
    settings: FeedSettings,
    cursor: PageCursor,
    items: Vec<RecommendationItem>,
    state: FeedState,
    focus: ActiveIndexController,
}

impl<S: RemoteSource> PaginationController<S> {
    pub fn new(
        acquirer: BatchAcquirer<S>,
        notifier: Arc<dyn Notifier>,
        settings: FeedSettings,
        focus: ActiveIndexController,
    ) -> Self {
        Self {
            acquirer,
            notifier,
            settings,
            cursor: PageCursor::new(),
            items: Vec::new(),
            state: FeedState::Idle,
            focus,
        }
    }

    pub fn items(&self) -> &[RecommendationItem] {
        &self.items
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Page the next acquisition will start at.
    pub fn page(&self) -> u32 {
        self.cursor.current()
    }

    /// Infinite-scroll gate: more can be loaded unless a refresh is running.
    pub fn has_more(&self) -> bool {
        self.state != FeedState::Refreshing
    }

    pub fn focus(&self) -> &ActiveIndexController {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut ActiveIndexController {
        &mut self.focus
    }

    /// How each acquisition round schedules its page requests.
    pub fn fetch_mode(&self) -> FetchMode {
        self.acquirer.mode()
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Takes effect on the next acquisition.
    pub fn set_filter(&mut self, filter: FilterConfig) {
        self.settings.filter = filter;
    }

    /// Enter the refreshing state and empty the view.
    ///
    /// Split from [`finish_refresh`](Self::finish_refresh) so the host can
    /// render the loading state before the request goes out. Returns
    /// `false` if a refresh is already running.
    pub fn begin_refresh(&mut self) -> bool {
        if self.state == FeedState::Refreshing {
            return false;
        }

        self.focus.clear_active_index();
        self.state = FeedState::Refreshing;
        self.items.clear();
        self.focus.set_len(0);
        self.cursor.reset();
        debug!("Refresh started");
        true
    }

    /// Load a fresh collection after [`begin_refresh`](Self::begin_refresh).
    pub async fn finish_refresh(&mut self, columns: usize) -> Result<FetchOutcome> {
        if self.state != FeedState::Refreshing {
            return Ok(FetchOutcome::Skipped);
        }

        let result = self.fill(Vec::new(), columns).await;
        self.state = FeedState::Idle;
        let outcome = self.commit(result);
        self.focus.clear_active_index();
        outcome
    }

    /// Replace the collection with a fresh first page.
    pub async fn refresh(&mut self, columns: usize) -> Result<FetchOutcome> {
        if !self.begin_refresh() {
            return Ok(FetchOutcome::Skipped);
        }
        self.finish_refresh(columns).await
    }

    /// Append until the last grid row is started, at most
    /// `max_iterations` rounds.
    pub async fn fetch_more(&mut self, columns: usize) -> Result<FetchOutcome> {
        if self.state != FeedState::Idle {
            return Ok(FetchOutcome::Skipped);
        }

        self.state = FeedState::FetchingMore;
        debug!("Fetching more from page {}", self.cursor.current());
        let before = self.items.len();
        let result = self.fill(self.items.clone(), columns).await;
        self.state = FeedState::Idle;

        let outcome = self.commit(result);
        debug!("Fetch more: len {} -> {}", before, self.items.len());
        outcome
    }

    fn commit(
        &mut self,
        result: std::result::Result<(Vec<RecommendationItem>, FetchOutcome), RetryExhausted>,
    ) -> Result<FetchOutcome> {
        match result {
            Ok((items, outcome)) => {
                self.items = items;
                self.focus.set_len(self.items.len());
                Ok(outcome)
            }
            Err(exhausted) => {
                self.notifier.error(&exhausted.user_message());
                Err(FeedError::RetryExhausted(exhausted))
            }
        }
    }

    async fn fill(
        &mut self,
        start: Vec<RecommendationItem>,
        columns: usize,
    ) -> std::result::Result<(Vec<RecommendationItem>, FetchOutcome), RetryExhausted> {
        let base = start.len();
        let target = least_required_count(base, columns);
        let mut items = start;
        let mut iterations = 0;

        while items.len() < target {
            if iterations >= self.settings.max_iterations {
                warn!(
                    "Stopped after {} rounds with {} of {} items",
                    iterations,
                    items.len(),
                    target
                );
                let added = items.len() - base;
                return Ok((
                    items,
                    FetchOutcome::IterationBoundExceeded {
                        added,
                        iterations,
                        target,
                    },
                ));
            }

            let batch = self
                .acquirer
                .acquire(self.settings.batch_pages, &mut self.cursor)
                .await?;
            iterations += 1;

            let batch = filter::apply(batch, &self.settings.filter);
            items = merge(&items, &batch);
        }

        let added = items.len() - base;
        Ok((items, FetchOutcome::Completed { added, iterations }))
    }
}
