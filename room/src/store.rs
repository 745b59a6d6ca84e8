//! In-process settlement store.
//!
//! Holds auction rows and the bid ledger in memory, seeded from a JSON file
//! at start-up. Suitable for single-node deployments and demos; a database
//! backed [`SettlementStore`] slots in behind the same trait.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::error::{RoomError, RoomResult};
use crate::traits::{AuctionRecord, AuctionStatus, LedgerEntry, SettlementOutcome, SettlementStore};

#[derive(Debug, Default)]
struct StoreInner {
    auctions: HashMap<String, AuctionRecord>,
    ledger: Vec<LedgerEntry>,
}

/// Shared in-memory auction table plus append-only bid ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of auction rows.
    pub fn with_auctions(records: impl IntoIterator<Item = AuctionRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Load auction rows from a JSON array on disk.
    pub fn from_seed_file(path: &Path) -> RoomResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            RoomError::Config(format!("Failed to read seed file {}: {e}", path.display()))
        })?;
        let records: Vec<AuctionRecord> = serde_json::from_slice(&data)?;
        info!(
            "Loaded {} auction(s) from seed file {}",
            records.len(),
            path.display()
        );
        Ok(Self::with_auctions(records))
    }

    /// Insert or replace an auction row.
    pub fn insert(&self, record: AuctionRecord) {
        self.inner.write().auctions.insert(record.id.clone(), record);
    }

    /// Current copy of an auction row.
    pub fn auction(&self, auction_id: &str) -> Option<AuctionRecord> {
        self.inner.read().auctions.get(auction_id).cloned()
    }

    /// Ledger entries for one auction, in insertion order.
    pub fn ledger_for(&self, auction_id: &str) -> Vec<LedgerEntry> {
        self.inner
            .read()
            .ledger
            .iter()
            .filter(|e| e.auction_id == auction_id)
            .cloned()
            .collect()
    }

    pub fn auction_count(&self) -> usize {
        self.inner.read().auctions.len()
    }
}

#[async_trait]
impl SettlementStore for MemoryStore {
    async fn load_auction(&self, auction_id: &str) -> RoomResult<Option<AuctionRecord>> {
        Ok(self.auction(auction_id))
    }

    async fn write_outcome(&self, outcome: &SettlementOutcome) -> RoomResult<()> {
        let mut inner = self.inner.write();
        let record = inner
            .auctions
            .get_mut(&outcome.auction_id)
            .ok_or_else(|| RoomError::AuctionNotFound(outcome.auction_id.clone()))?;
        record.status = AuctionStatus::Ended;
        record.current_price = Some(outcome.final_price);
        record.highest_bidder_id.clone_from(&outcome.winner);
        record.total_bids = outcome.total_bids;
        record.reserve_met = Some(outcome.reserve_met);
        record.settled_at = Some(outcome.settled_at);
        Ok(())
    }

    async fn append_ledger(&self, entries: &[LedgerEntry]) -> RoomResult<()> {
        self.inner.write().ledger.extend_from_slice(entries);
        Ok(())
    }
}
