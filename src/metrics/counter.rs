use std::sync::atomic::{AtomicU64, Ordering};

/// Number of samples generated since construction or the last reset.
///
/// Shared between the generator and `/info` through an `Arc`. Every
/// `increment` returns a distinct value, even under parallel callers.
#[derive(Debug, Default)]
pub struct RequestCounter {
    value: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the counter and return the post-increment value.
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Back to zero. Only tests call this; there is no route for it.
    pub fn reset(&self) {
        self.value.store(0, Ordering::SeqCst);
    }
}
