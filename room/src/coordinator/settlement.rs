//! Auction-end orchestration: persist the outcome, notify, close.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::AuctionCoordinator;
use crate::auction::{AuctionEndedData, ServerFrame};
use crate::config::{
    AUCTION_ENDED_CLOSE_CODE, AUCTION_ENDED_CLOSE_REASON, SETTLEMENT_WRITE_TIMEOUT_SECS,
};
use crate::error::{RoomError, RoomResult};
use crate::traits::{SettlementOutcome, SettlementStore, TimeProvider};

/// Run one store write with the settlement timeout applied.
pub(crate) async fn bounded<F>(write: F) -> RoomResult<()>
where
    F: Future<Output = RoomResult<()>>,
{
    tokio::time::timeout(Duration::from_secs(SETTLEMENT_WRITE_TIMEOUT_SECS), write)
        .await
        .unwrap_or_else(|_| {
            Err(RoomError::StoreUnavailable(format!(
                "write timed out after {SETTLEMENT_WRITE_TIMEOUT_SECS}s"
            )))
        })
}

impl<S: SettlementStore, C: TimeProvider> AuctionCoordinator<S, C> {
    /// Settle the auction. Only the first call while `Open` does anything.
    ///
    /// Store writes are best effort: a failure is logged and the auction
    /// still closes, so bidders are never left waiting on the store. Returns
    /// the outcome when its write failed.
    pub(super) async fn finalize(&mut self) -> Option<SettlementOutcome> {
        let now = self.clock.now_unix_ms();
        let Some(settlement) = self.state.begin_settlement(now) else {
            debug!(
                "Ignoring settlement wake-up for auction {} in phase {:?}",
                self.state.auction_id(),
                self.state.phase()
            );
            return None;
        };
        let outcome = &settlement.outcome;
        info!(
            "Settling auction {}: final price {}, winner {:?}, {} bid(s)",
            outcome.auction_id, outcome.final_price, outcome.winner, outcome.total_bids
        );
        if !outcome.reserve_met {
            warn!(
                "Auction {} closed below its reserve of {:?}",
                outcome.auction_id,
                self.state.reserve_price()
            );
        }

        let unpersisted = match bounded(self.store.write_outcome(outcome)).await {
            Ok(()) => None,
            Err(e) => {
                error!(
                    "Failed to persist outcome for auction {}: {}",
                    outcome.auction_id, e
                );
                Some(outcome.clone())
            }
        };
        if !settlement.ledger.is_empty() {
            if let Err(e) = bounded(self.store.append_ledger(&settlement.ledger)).await {
                error!(
                    "Failed to append {} ledger entries for auction {}: {}",
                    settlement.ledger.len(),
                    outcome.auction_id,
                    e
                );
            }
        }

        let delivered = self.sessions.broadcast(&ServerFrame::AuctionEnded {
            data: AuctionEndedData {
                final_price: outcome.final_price,
                winner: outcome.winner.clone(),
            },
        });
        self.sessions
            .close_all(AUCTION_ENDED_CLOSE_CODE, AUCTION_ENDED_CLOSE_REASON);
        self.state.close();
        info!(
            "Auction {} closed, {} session(s) notified",
            self.state.auction_id(),
            delivered
        );
        unpersisted
    }
}
