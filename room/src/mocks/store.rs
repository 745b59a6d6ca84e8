//! Mock settlement store for testing.

use crate::error::{RoomError, RoomResult};
use crate::store::MemoryStore;
use crate::traits::{AuctionRecord, LedgerEntry, SettlementOutcome, SettlementStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Types of failures that can be simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStoreFailure {
    /// Fail all operations.
    All,
    /// Fail only the initialization read.
    Reads,
    /// Fail only settlement writes.
    Writes,
}

#[derive(Debug, Default)]
struct Counters {
    loads: AtomicUsize,
    outcome_writes: AtomicUsize,
    ledger_writes: AtomicUsize,
}

/// Mock settlement store.
///
/// Wraps a [`MemoryStore`] and adds failure injection, call counters and an
/// optional artificial read latency (useful for racing concurrent opens).
#[derive(Debug, Clone)]
pub struct MockStore {
    backing: MemoryStore,
    fail_mode: Arc<RwLock<Option<MockStoreFailure>>>,
    load_delay: Arc<RwLock<Option<std::time::Duration>>>,
    counters: Arc<Counters>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            backing: MemoryStore::new(),
            fail_mode: Arc::new(RwLock::new(None)),
            load_delay: Arc::new(RwLock::new(None)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_auctions(records: impl IntoIterator<Item = AuctionRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.backing.insert(record);
        }
        store
    }

    /// Access the wrapped store for assertions on rows and ledger.
    pub const fn backing(&self) -> &MemoryStore {
        &self.backing
    }

    /// Set failure mode for testing error handling.
    pub async fn set_fail_mode(&self, mode: Option<MockStoreFailure>) {
        *self.fail_mode.write().await = mode;
    }

    /// Delay every `load_auction` call by the given duration.
    pub async fn set_load_delay(&self, delay: Option<std::time::Duration>) {
        *self.load_delay.write().await = delay;
    }

    pub fn load_count(&self) -> usize {
        self.counters.loads.load(Ordering::SeqCst)
    }

    pub fn outcome_write_count(&self) -> usize {
        self.counters.outcome_writes.load(Ordering::SeqCst)
    }

    pub fn ledger_write_count(&self) -> usize {
        self.counters.ledger_writes.load(Ordering::SeqCst)
    }

    async fn fails_reads(&self) -> bool {
        matches!(
            *self.fail_mode.read().await,
            Some(MockStoreFailure::All | MockStoreFailure::Reads)
        )
    }

    async fn fails_writes(&self) -> bool {
        matches!(
            *self.fail_mode.read().await,
            Some(MockStoreFailure::All | MockStoreFailure::Writes)
        )
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementStore for MockStore {
    async fn load_auction(&self, auction_id: &str) -> RoomResult<Option<AuctionRecord>> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.load_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fails_reads().await {
            return Err(RoomError::StoreUnavailable("simulated read failure".into()));
        }
        self.backing.load_auction(auction_id).await
    }

    async fn write_outcome(&self, outcome: &SettlementOutcome) -> RoomResult<()> {
        self.counters.outcome_writes.fetch_add(1, Ordering::SeqCst);
        if self.fails_writes().await {
            return Err(RoomError::StoreUnavailable("simulated write failure".into()));
        }
        self.backing.write_outcome(outcome).await
    }

    async fn append_ledger(&self, entries: &[LedgerEntry]) -> RoomResult<()> {
        self.counters.ledger_writes.fetch_add(1, Ordering::SeqCst);
        if self.fails_writes().await {
            return Err(RoomError::StoreUnavailable("simulated write failure".into()));
        }
        self.backing.append_ledger(entries).await
    }
}

/// A fresh, active auction row ending `duration_ms` after `now_ms`.
pub fn make_test_record(id: &str, start_price: f64, now_ms: u64, duration_ms: u64) -> AuctionRecord {
    AuctionRecord {
        id: id.to_string(),
        start_price,
        current_price: None,
        highest_bidder_id: None,
        end_time: now_ms + duration_ms,
        reserve_price: None,
        status: crate::traits::AuctionStatus::Active,
        total_bids: 0,
        reserve_met: None,
        settled_at: None,
    }
}
