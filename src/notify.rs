//! User-facing diagnostic channel.
//!
//! Pipeline stages report problems through [`Notifier`]; the TUI backs it
//! with a [`ToastQueue`] that auto-dismisses messages after their duration.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long fetch failures stay on screen.
pub const ERROR_TOAST_DURATION: Duration = Duration::from_millis(5000);

/// Maximum number of toasts rendered at once.
pub const MAX_VISIBLE_TOASTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

/// Sink for transient user-visible messages. Must not fail.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, message: &str, duration: Duration);

    fn error(&self, message: &str) {
        self.notify(ToastLevel::Error, message, ERROR_TOAST_DURATION);
    }

    fn info(&self, message: &str) {
        self.notify(ToastLevel::Info, message, Duration::from_secs(3));
    }
}

/// Discards every message. Useful for headless callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _level: ToastLevel, _message: &str, _duration: Duration) {}
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    expires: Instant,
}

impl Toast {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }
}

/// Thread-safe queue of pending toasts.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired toasts.
    pub fn prune(&self) {
        let now = Instant::now();
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.retain(|t| !t.is_expired(now));
        }
    }

    /// Toasts still on screen, newest last.
    pub fn visible(&self) -> Vec<Toast> {
        let now = Instant::now();
        match self.toasts.lock() {
            Ok(toasts) => {
                let live: Vec<Toast> = toasts
                    .iter()
                    .filter(|t| !t.is_expired(now))
                    .cloned()
                    .collect();
                let skip = live.len().saturating_sub(MAX_VISIBLE_TOASTS);
                live.into_iter().skip(skip).collect()
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, level: ToastLevel, message: &str, duration: Duration) {
        if let Ok(mut toasts) = self.toasts.lock() {
            // same message replaces the older copy
            toasts.retain(|t| t.message != message);
            toasts.push(Toast {
                level,
                message: message.to_string(),
                expires: Instant::now() + duration,
            });
            let overflow = toasts.len().saturating_sub(MAX_VISIBLE_TOASTS * 2);
            toasts.drain(..overflow);
        }
    }
}
