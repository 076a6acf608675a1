//! Custom error types for rec-grid.
//!
//! Failures originate only in the network-facing stages. A single failed
//! attempt is an [`AttemptError`]; running out of attempts produces
//! [`RetryExhausted`]; everything that escapes to the application is a
//! [`FeedError`].

use std::io;
use std::time::Duration;

/// Why one attempt against the remote source failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AttemptError {
    /// The distinguished auth-failure code; worth another attempt.
    #[error("auth failed (code={code}): {message}")]
    AuthFailed { code: i64, message: String },

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connection or HTTP level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// No payload and an error code we do not know how to recover from.
    #[error("unexpected response (code={code}): {message}")]
    Unexpected { code: i64, message: String },

    /// The body could not be decoded at all.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl AttemptError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttemptError::AuthFailed { .. } | AttemptError::Timeout(_) | AttemptError::Transport(_)
        )
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AttemptError::Malformed(err.to_string())
        } else {
            AttemptError::Transport(err.to_string())
        }
    }
}

/// Every attempt for one call failed.
///
/// Carries the per-attempt errors in the order they happened.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("request failed after {} attempts", .errors.len())]
pub struct RetryExhausted {
    pub errors: Vec<AttemptError>,
}

impl RetryExhausted {
    pub fn attempts(&self) -> usize {
        self.errors.len()
    }

    /// Message shown to the user, built only from the attempt errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use rec_grid::error::{AttemptError, RetryExhausted};
    ///
    /// let err = RetryExhausted {
    ///     errors: vec![AttemptError::Transport("reset".to_string())],
    /// };
    /// assert!(err.user_message().starts_with("Request failed after 1 attempts:"));
    /// ```
    pub fn user_message(&self) -> String {
        let mut lines = vec![format!("Request failed after {} attempts:", self.attempts())];
        lines.extend(
            self.errors
                .iter()
                .enumerate()
                .map(|(i, e)| format!("  {}) {}", i + 1, e)),
        );
        lines.push(String::new());
        lines.push("Please refresh your access_key and try again.".to_string());
        lines.join("\n")
    }
}

/// Application error types.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error(transparent)]
    RetryExhausted(#[from] RetryExhausted),

    /// The HTTP client could not be set up.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<toml::de::Error> for FeedError {
    fn from(err: toml::de::Error) -> Self {
        FeedError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FeedError {
    fn from(err: toml::ser::Error) -> Self {
        FeedError::Config(err.to_string())
    }
}

/// Result type alias using FeedError.
pub type Result<T> = std::result::Result<T, FeedError>;
