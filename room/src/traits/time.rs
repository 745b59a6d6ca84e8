//! Wall clock seen by coordinators.
//!
//! Bid timestamps, the anti-snipe window and settlement times are all read
//! from a [`TimeProvider`], never from the system clock directly.

/// Source of Unix milliseconds.
pub trait TimeProvider: Send + Sync + Clone + 'static {
    fn now_unix_ms(&self) -> u64;

    /// Milliseconds left until `deadline_ms`, or zero once it has passed.
    fn until(&self, deadline_ms: u64) -> u64 {
        deadline_ms.saturating_sub(self.now_unix_ms())
    }
}

/// The host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl SystemTimeProvider {
    pub const fn new() -> Self {
        Self
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_unix_ms(&self) -> u64 {
        crate::config::now_unix_ms()
    }
}
