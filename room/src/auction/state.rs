//! Canonical auction state and its bid/settlement state machine.
//!
//! [`AuctionState`] is pure: it never touches the clock, the store or the
//! network. The coordinator feeds it timestamps and carries out the side
//! effects it asks for, which keeps every invariant testable in isolation.

use serde::{Deserialize, Serialize};

use crate::config::{ANTI_SNIPE_EXTENSION_MS, ANTI_SNIPE_WINDOW_MS, SETTLEMENT_LEDGER_CAP};
use crate::error::{RoomError, RoomResult};
use crate::traits::{AuctionRecord, AuctionStatus, LedgerEntry, SettlementOutcome};

/// Lifecycle phase. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Open,
    Settling,
    Closed,
}

/// One accepted bid. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidEntry {
    pub bidder_id: String,
    pub amount: f64,
    /// Unix milliseconds at acceptance.
    pub timestamp: u64,
}

/// Public view of the auction sent to clients on connect and after every bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    pub current_price: f64,
    pub highest_bidder: Option<String>,
    /// Unix milliseconds.
    pub end_time: u64,
    pub total_bids: u64,
}

/// Result of a successfully applied bid.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedBid {
    pub snapshot: AuctionSnapshot,
    /// Whether the anti-snipe rule pushed the deadline back.
    pub extended: bool,
}

/// Everything the coordinator needs to persist when the auction closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub outcome: SettlementOutcome,
    /// The most recent bids, oldest first, capped at [`SETTLEMENT_LEDGER_CAP`].
    pub ledger: Vec<LedgerEntry>,
}

/// Mutable auction state owned by exactly one coordinator.
#[derive(Debug, Clone)]
pub struct AuctionState {
    auction_id: String,
    start_price: f64,
    reserve_price: Option<f64>,
    current_price: f64,
    highest_bidder: Option<String>,
    end_time: u64,
    bid_history: Vec<BidEntry>,
    /// Bids recorded on the stored row before this instance was hydrated.
    prior_bids: u64,
    phase: Phase,
}

impl AuctionState {
    /// A fresh, uninitialized state for `auction_id`.
    pub fn new(auction_id: impl Into<String>) -> Self {
        Self {
            auction_id: auction_id.into(),
            start_price: 0.0,
            reserve_price: None,
            current_price: 0.0,
            highest_bidder: None,
            end_time: 0,
            bid_history: Vec::new(),
            prior_bids: 0,
            phase: Phase::Uninitialized,
        }
    }

    /// Hydrate from the stored auction row and open for bidding.
    ///
    /// Fails with `AuctionEnded` for rows that were already settled, in which
    /// case the state stays `Uninitialized`.
    pub fn initialize(&mut self, record: &AuctionRecord) -> RoomResult<()> {
        if self.phase != Phase::Uninitialized {
            return Err(RoomError::InvalidState(format!(
                "auction {} already initialized ({:?})",
                self.auction_id, self.phase
            )));
        }
        if record.status == AuctionStatus::Ended {
            return Err(RoomError::AuctionEnded);
        }

        // A stored price below the start price would break `current >= start`.
        let current = record
            .current_price
            .unwrap_or(record.start_price)
            .max(record.start_price);

        self.start_price = record.start_price;
        self.reserve_price = record.reserve_price;
        self.current_price = current;
        self.highest_bidder.clone_from(&record.highest_bidder_id);
        self.end_time = record.end_time;
        self.prior_bids = record.total_bids;
        self.phase = Phase::Open;
        Ok(())
    }

    /// Validate and apply a bid submitted at `now` (Unix milliseconds).
    ///
    /// Checks run in a fixed order: phase, deadline, input shape, price.
    /// A rejected bid leaves the state untouched.
    pub fn place_bid(&mut self, bidder_id: &str, amount: f64, now: u64) -> RoomResult<AcceptedBid> {
        if self.phase != Phase::Open {
            return Err(RoomError::AuctionEnded);
        }
        if now >= self.end_time {
            return Err(RoomError::AuctionEnded);
        }
        if bidder_id.trim().is_empty() {
            return Err(RoomError::InvalidBid("bidder id must not be empty".into()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(RoomError::InvalidBid(format!(
                "amount must be a positive number, got {amount}"
            )));
        }
        if amount <= self.current_price {
            return Err(RoomError::BidTooLow {
                current_price: self.current_price,
            });
        }

        self.current_price = amount;
        self.highest_bidder = Some(bidder_id.to_string());
        self.bid_history.push(BidEntry {
            bidder_id: bidder_id.to_string(),
            amount,
            timestamp: now,
        });

        let extended = now > self.end_time.saturating_sub(ANTI_SNIPE_WINDOW_MS);
        if extended {
            self.end_time += ANTI_SNIPE_EXTENSION_MS;
        }

        Ok(AcceptedBid {
            snapshot: self.snapshot(),
            extended,
        })
    }

    /// Move `Open -> Settling` and produce what must be persisted.
    ///
    /// Returns `None` in any other phase, so a second wake-up is a no-op.
    pub fn begin_settlement(&mut self, now: u64) -> Option<Settlement> {
        if self.phase != Phase::Open {
            return None;
        }
        self.phase = Phase::Settling;

        let outcome = SettlementOutcome {
            auction_id: self.auction_id.clone(),
            final_price: self.current_price,
            winner: self.highest_bidder.clone(),
            total_bids: self.total_bids(),
            reserve_met: self.reserve_met(),
            settled_at: now,
        };

        let skip = self.bid_history.len().saturating_sub(SETTLEMENT_LEDGER_CAP);
        let ledger = self.bid_history[skip..]
            .iter()
            .map(|bid| LedgerEntry {
                auction_id: self.auction_id.clone(),
                bidder_id: bid.bidder_id.clone(),
                amount: bid.amount,
                created_at: bid.timestamp,
            })
            .collect();

        Some(Settlement { outcome, ledger })
    }

    /// Move `Settling -> Closed`. No further mutation is possible afterwards.
    pub fn close(&mut self) {
        if self.phase == Phase::Settling {
            self.phase = Phase::Closed;
        }
    }

    /// True when there is no reserve, or a winner met it.
    pub fn reserve_met(&self) -> bool {
        match self.reserve_price {
            None => true,
            Some(reserve) => self.highest_bidder.is_some() && self.current_price >= reserve,
        }
    }

    pub fn snapshot(&self) -> AuctionSnapshot {
        AuctionSnapshot {
            current_price: self.current_price,
            highest_bidder: self.highest_bidder.clone(),
            end_time: self.end_time,
            total_bids: self.total_bids(),
        }
    }

    pub fn total_bids(&self) -> u64 {
        self.prior_bids + self.bid_history.len() as u64
    }

    pub fn auction_id(&self) -> &str {
        &self.auction_id
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn end_time(&self) -> u64 {
        self.end_time
    }

    pub const fn current_price(&self) -> f64 {
        self.current_price
    }

    pub const fn start_price(&self) -> f64 {
        self.start_price
    }

    pub const fn reserve_price(&self) -> Option<f64> {
        self.reserve_price
    }

    pub fn highest_bidder(&self) -> Option<&str> {
        self.highest_bidder.as_deref()
    }

    pub fn bid_history(&self) -> &[BidEntry] {
        &self.bid_history
    }
}
