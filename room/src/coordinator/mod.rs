//! Per-auction coordinator: the single owner of an auction's state.
//!
//! [`AuctionCoordinator`] runs as its own task. Everything that touches the
//! auction (bids, session attach/detach, the settlement alarm) is funneled
//! through one command queue, so operations are applied one at a time in
//! arrival order. Callers talk to it through a cloneable
//! [`CoordinatorHandle`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::auction::{AuctionSnapshot, AuctionState, Phase, ServerFrame};
use crate::config::COORDINATOR_QUEUE_CAPACITY;
use crate::error::{RoomError, RoomResult};
use crate::traits::{SettlementOutcome, SettlementStore, TimeProvider};

mod broadcast;
mod settlement;

pub(crate) use settlement::bounded;

pub use broadcast::{Outbound, SessionId};
use broadcast::SessionSet;

/// Point-in-time view of a coordinator, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomStatus {
    pub phase: Phase,
    pub snapshot: AuctionSnapshot,
    pub sessions: usize,
}

enum Command {
    Attach {
        outbound: mpsc::Sender<Outbound>,
        reply: oneshot::Sender<RoomResult<SessionId>>,
    },
    Detach {
        session: SessionId,
    },
    PlaceBid {
        bidder_id: String,
        amount: f64,
        reply: oneshot::Sender<RoomResult<AuctionSnapshot>>,
    },
    Status {
        reply: oneshot::Sender<RoomStatus>,
    },
    #[cfg(any(test, feature = "test-support"))]
    FireAlarm,
}

/// Cheap, cloneable front door to a running coordinator.
///
/// Once the coordinator has settled and exited, every request resolves to
/// [`RoomError::AuctionEnded`].
#[derive(Clone)]
pub struct CoordinatorHandle {
    auction_id: Arc<str>,
    tx: mpsc::Sender<Command>,
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("auction_id", &self.auction_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl CoordinatorHandle {
    pub fn auction_id(&self) -> &str {
        &self.auction_id
    }

    /// True once the coordinator task has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> RoomResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| RoomError::AuctionEnded)?;
        rx.await.map_err(|_| RoomError::AuctionEnded)
    }

    /// Register a session. The coordinator pushes the current snapshot to
    /// `outbound` before replying.
    pub async fn attach(&self, outbound: mpsc::Sender<Outbound>) -> RoomResult<SessionId> {
        self.request(|reply| Command::Attach { outbound, reply })
            .await?
    }

    /// Forget a session. Fire-and-forget; a closed coordinator has already
    /// dropped all of its sessions.
    pub async fn detach(&self, session: SessionId) {
        let _ = self.tx.send(Command::Detach { session }).await;
    }

    /// Submit a bid. Resolves after the bid is applied (or rejected) and
    /// strictly before the resulting `auction_update` is broadcast.
    pub async fn place_bid(&self, bidder_id: &str, amount: f64) -> RoomResult<AuctionSnapshot> {
        let bidder_id = bidder_id.to_string();
        self.request(|reply| Command::PlaceBid {
            bidder_id,
            amount,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self) -> RoomResult<AuctionSnapshot> {
        Ok(self.status().await?.snapshot)
    }

    pub async fn status(&self) -> RoomResult<RoomStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Deliver the settlement wake-up now, as if the deadline had passed.
    ///
    /// The coordinator exits as soon as it has settled, so anything queued
    /// behind the first wake-up is dropped unread.
    #[cfg(any(test, feature = "test-support"))]
    pub async fn fire_alarm(&self) -> RoomResult<()> {
        self.tx
            .send(Command::FireAlarm)
            .await
            .map_err(|_| RoomError::AuctionEnded)
    }
}

/// Owns one auction's state, its sessions and its settlement alarm.
pub struct AuctionCoordinator<S: SettlementStore, C: TimeProvider> {
    state: AuctionState,
    store: S,
    clock: C,
    sessions: SessionSet,
    commands: mpsc::Receiver<Command>,
}

impl<S: SettlementStore, C: TimeProvider> AuctionCoordinator<S, C> {
    /// Load the auction row, open the auction and spawn its task.
    ///
    /// This is the only store read in the coordinator's lifetime. A missing
    /// row yields `AuctionNotFound`, a read failure `StoreUnavailable`, and a
    /// row already settled `AuctionEnded`.
    ///
    /// The task resolves to the outcome if settlement could not write it,
    /// so the caller can keep it instead of trusting the stale row.
    pub async fn start(
        auction_id: &str,
        store: S,
        clock: C,
    ) -> RoomResult<(CoordinatorHandle, JoinHandle<Option<SettlementOutcome>>)> {
        let record = match store.load_auction(auction_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(RoomError::AuctionNotFound(auction_id.to_string())),
            Err(e @ RoomError::StoreUnavailable(_)) => return Err(e),
            Err(e) => return Err(RoomError::StoreUnavailable(e.to_string())),
        };

        let mut state = AuctionState::new(auction_id);
        state.initialize(&record)?;
        info!(
            "Opened auction {} at {} (ends at {})",
            auction_id,
            state.current_price(),
            state.end_time()
        );

        let (tx, commands) = mpsc::channel(COORDINATOR_QUEUE_CAPACITY);
        let coordinator = Self {
            state,
            store,
            clock,
            sessions: SessionSet::default(),
            commands,
        };
        let task = tokio::spawn(coordinator.run());

        Ok((
            CoordinatorHandle {
                auction_id: Arc::from(auction_id),
                tx,
            },
            task,
        ))
    }

    /// Monotonic instant at which the current deadline falls due.
    fn deadline(&self) -> Instant {
        Instant::now() + Duration::from_millis(self.clock.until(self.state.end_time()))
    }

    async fn run(mut self) -> Option<SettlementOutcome> {
        let alarm = tokio::time::sleep_until(self.deadline());
        tokio::pin!(alarm);
        let mut unpersisted = None;

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("All handles to auction {} dropped", self.state.auction_id());
                        break;
                    };
                    match command {
                        Command::Attach { outbound, reply } => {
                            let _ = reply.send(self.handle_attach(outbound));
                        }
                        Command::Detach { session } => {
                            if self.sessions.detach(session) {
                                debug!("Session {} left auction {}", session, self.state.auction_id());
                            }
                        }
                        Command::PlaceBid { bidder_id, amount, reply } => {
                            let result = self.handle_place_bid(&bidder_id, amount, reply);
                            if result == BidOutcome::Extended {
                                alarm.as_mut().reset(self.deadline());
                            }
                        }
                        Command::Status { reply } => {
                            let _ = reply.send(RoomStatus {
                                phase: self.state.phase(),
                                snapshot: self.state.snapshot(),
                                sessions: self.sessions.len(),
                            });
                        }
                        #[cfg(any(test, feature = "test-support"))]
                        Command::FireAlarm => unpersisted = self.finalize().await,
                    }
                }
                () = &mut alarm, if self.state.phase() == Phase::Open => {
                    unpersisted = self.finalize().await;
                }
            }

            if self.state.phase() == Phase::Closed {
                break;
            }
        }
        debug!("Coordinator for auction {} exited", self.state.auction_id());
        unpersisted
    }

    fn handle_attach(&mut self, outbound: mpsc::Sender<Outbound>) -> RoomResult<SessionId> {
        if self.state.phase() != Phase::Open {
            return Err(RoomError::AuctionEnded);
        }
        let id = self.sessions.attach(outbound);
        let frame = ServerFrame::AuctionState {
            data: self.state.snapshot(),
        };
        if !self.sessions.send_to(id, frame) {
            debug!("Session {} vanished before its snapshot", id);
        }
        debug!(
            "Session {} joined auction {} ({} live)",
            id,
            self.state.auction_id(),
            self.sessions.len()
        );
        Ok(id)
    }

    /// Apply a bid, answer the submitter, then broadcast on success.
    ///
    /// The reply is sent before the broadcast so the submitting session can
    /// always write its `bid_result` ahead of the matching update.
    fn handle_place_bid(
        &mut self,
        bidder_id: &str,
        amount: f64,
        reply: oneshot::Sender<RoomResult<AuctionSnapshot>>,
    ) -> BidOutcome {
        let now = self.clock.now_unix_ms();
        match self.state.place_bid(bidder_id, amount, now) {
            Ok(accepted) => {
                let _ = reply.send(Ok(accepted.snapshot.clone()));
                if accepted.extended {
                    info!(
                        "Anti-snipe: auction {} extended to {}",
                        self.state.auction_id(),
                        accepted.snapshot.end_time
                    );
                }
                let delivered = self.sessions.broadcast(&ServerFrame::AuctionUpdate {
                    data: accepted.snapshot,
                });
                debug!(
                    "Bid {} by {} on auction {} broadcast to {} session(s)",
                    amount,
                    bidder_id,
                    self.state.auction_id(),
                    delivered
                );
                if accepted.extended {
                    BidOutcome::Extended
                } else {
                    BidOutcome::Accepted
                }
            }
            Err(e) => {
                if !e.is_validation() {
                    warn!("Bid on auction {} failed: {}", self.state.auction_id(), e);
                }
                let _ = reply.send(Err(e));
                BidOutcome::Rejected
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BidOutcome {
    Accepted,
    Extended,
    Rejected,
}
