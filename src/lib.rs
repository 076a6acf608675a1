//! A terminal client for an infinite recommendation feed.
//!
//! rec-grid pulls recommendations from the app feed endpoint in batches of
//! pages, retries failed attempts, drops duplicates and filtered items, and
//! shows the result as a keyboard-navigable grid that keeps loading as you
//! scroll.
//!
//! # Features
//!
//! - Bounded retries with per-attempt timeouts and an attempt observer
//! - Sequential or parallel page batches with stable ordering
//! - Filtering by play count and duration
//! - Focus navigation that keeps the active card on screen
//!
//! # Usage
//!
//! ```bash
//! # Run with the access key from the config file
//! cargo run
//!
//! # Fetch each batch's pages concurrently
//! cargo run -- --parallel
//! ```

pub mod api;
pub mod batch;
pub mod config;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod filter;
pub mod focus;
pub mod notify;
pub mod overlay;
pub mod retry;
pub mod tui;
pub mod types;
