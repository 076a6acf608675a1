//! Reference-counted lock held by visible overlays.
//!
//! Any number of overlays may hold it at once. The grid treats the lock as
//! "someone else owns the keyboard and scrolling" until the count drops back
//! to zero.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide lock shared by every overlay in the application.
pub static OVERLAYS: OverlayLock = OverlayLock::new();

#[derive(Debug, Default)]
pub struct OverlayLock {
    count: AtomicUsize,
}

impl OverlayLock {
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    pub fn acquire(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Release one hold. Extra releases leave the count at zero.
    pub fn release(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn is_held(&self) -> bool {
        self.count() > 0
    }
}
