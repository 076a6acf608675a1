//! Terminal User Interface for rec-grid using ratatui.
//!
//! This module renders the recommendation grid and translates key presses
//! into focus moves and feed actions.

mod render;
mod state;
mod types;

pub use render::draw;
pub use state::App;
pub use types::{Action, FeedView};
