//! Settlement store abstraction: where auctions are read from at start-up
//! and where their outcome is written once they close.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RoomResult;

/// Lifecycle flag stored alongside each auction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    /// Accepting bids (or waiting for a coordinator to open it).
    #[default]
    Active,
    /// Settled; the outcome below is final.
    Ended,
}

/// Durable auction row as seen by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub id: String,
    pub start_price: f64,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub highest_bidder_id: Option<String>,
    /// Unix milliseconds.
    pub end_time: u64,
    #[serde(default)]
    pub reserve_price: Option<f64>,
    #[serde(default)]
    pub status: AuctionStatus,
    #[serde(default)]
    pub total_bids: u64,
    /// Set at settlement; `None` while the auction is active.
    #[serde(default)]
    pub reserve_met: Option<bool>,
    /// Unix milliseconds. Set at settlement.
    #[serde(default)]
    pub settled_at: Option<u64>,
}

/// Final result written back to the auction row at settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub auction_id: String,
    pub final_price: f64,
    pub winner: Option<String>,
    pub total_bids: u64,
    pub reserve_met: bool,
    /// Unix milliseconds.
    pub settled_at: u64,
}

/// One retained bid in the append-only ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub auction_id: String,
    pub bidder_id: String,
    pub amount: f64,
    /// Unix milliseconds.
    pub created_at: u64,
}

/// Abstraction over the durable auction store.
///
/// A coordinator performs exactly one read (on initialization) and at most
/// one settlement (outcome plus ledger) per auction lifecycle.
#[async_trait]
pub trait SettlementStore: Send + Sync + Clone + 'static {
    /// Fetch the auction row.
    ///
    /// Returns `None` if no such auction exists. Errors are I/O failures.
    async fn load_auction(&self, auction_id: &str) -> RoomResult<Option<AuctionRecord>>;

    /// Mark the auction ended and record the full outcome.
    ///
    /// Writing the same outcome twice leaves the row unchanged.
    async fn write_outcome(&self, outcome: &SettlementOutcome) -> RoomResult<()>;

    /// Append bids to the ledger. Never rewrites earlier entries.
    async fn append_ledger(&self, entries: &[LedgerEntry]) -> RoomResult<()>;
}
