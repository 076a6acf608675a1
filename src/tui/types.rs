//! TUI type definitions for actions and the read-only feed snapshot.

use crate::feed::FeedState;
use crate::types::RecommendationItem;

/// Actions that can be returned from the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action, continue running
    None,
    /// Quit the application
    Quit,
    /// Replace the grid with fresh recommendations
    Refresh,
    /// Open the item at this index
    Open(usize),
}

/// Everything the renderer needs from the pagination controller.
#[derive(Debug, Clone, Copy)]
pub struct FeedView<'a> {
    pub items: &'a [RecommendationItem],
    pub active: Option<usize>,
    pub state: FeedState,
    pub page: u32,
    pub parallel: bool,
}
