//! Hand-driven clock for deadline and anti-snipe tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::traits::TimeProvider;

/// 2024-01-01T00:00:00Z in Unix milliseconds.
const EPOCH_2024_MS: u64 = 1_704_067_200_000;

/// Clock that only moves when a test moves it. Clones share one reading, so
/// a test keeps a copy and steers every coordinator built from it.
#[derive(Debug, Clone)]
pub struct MockTime {
    now_ms: Arc<AtomicU64>,
}

impl MockTime {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    /// Starts at 2024-01-01 UTC.
    pub fn default_time() -> Self {
        Self::new(EPOCH_2024_MS)
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs * 1000);
    }

    pub fn get(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

impl Default for MockTime {
    fn default() -> Self {
        Self::default_time()
    }
}

impl TimeProvider for MockTime {
    fn now_unix_ms(&self) -> u64 {
        self.get()
    }
}
