//! Routes auction ids to their one live coordinator.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::coordinator::{bounded, AuctionCoordinator, CoordinatorHandle};
use crate::error::{RoomError, RoomResult};
use crate::traits::{SettlementOutcome, SettlementStore, TimeProvider};

type RoomSlot = Arc<OnceCell<CoordinatorHandle>>;

#[derive(Default)]
struct Rooms {
    live: HashMap<String, RoomSlot>,
    /// Settled in memory but never written; the stored row is stale.
    unpersisted: HashMap<String, SettlementOutcome>,
}

enum Lookup {
    Live(RoomSlot),
    Unpersisted(SettlementOutcome),
}

/// Lazily creates coordinators and hands out handles to them.
///
/// Concurrent opens of the same id share a single initialization, so at
/// most one coordinator per auction is ever live. A failed initialization
/// leaves nothing behind; the next open tries again. Coordinators that have
/// settled are reaped once their task exits.
///
/// An auction whose outcome write failed is never reopened from its row.
/// The registry keeps the announced outcome, retries the write on each open
/// and refuses the connection either way.
pub struct RoomRegistry<S: SettlementStore, C: TimeProvider> {
    store: S,
    clock: C,
    rooms: Mutex<Rooms>,
}

impl<S: SettlementStore, C: TimeProvider> RoomRegistry<S, C> {
    pub fn new(store: S, clock: C) -> Arc<Self> {
        Arc::new(Self {
            store,
            clock,
            rooms: Mutex::new(Rooms::default()),
        })
    }

    /// Handle to the live coordinator for `auction_id`, creating it if needed.
    pub async fn open(self: &Arc<Self>, auction_id: &str) -> RoomResult<CoordinatorHandle> {
        let slot = match self.lookup(auction_id) {
            Lookup::Live(slot) => slot,
            Lookup::Unpersisted(outcome) => {
                self.retry_outcome(&outcome).await;
                return Err(RoomError::AuctionEnded);
            }
        };
        let result = slot
            .get_or_try_init(|| self.spawn_room(auction_id, &slot))
            .await;
        match result {
            Ok(handle) if !handle.is_closed() => Ok(handle.clone()),
            // Settled, but the reaper has not run yet.
            Ok(_) => Err(RoomError::AuctionEnded),
            Err(e) => {
                self.rooms.lock().remove_live(auction_id, &slot);
                Err(e)
            }
        }
    }

    /// Number of auctions with a running coordinator.
    pub fn live_rooms(&self) -> usize {
        self.rooms
            .lock()
            .live
            .values()
            .filter(|slot| slot.get().is_some_and(|h| !h.is_closed()))
            .count()
    }

    /// Number of settled auctions still waiting for their outcome write.
    pub fn unpersisted_rooms(&self) -> usize {
        self.rooms.lock().unpersisted.len()
    }

    fn lookup(&self, auction_id: &str) -> Lookup {
        let mut rooms = self.rooms.lock();
        if let Some(outcome) = rooms.unpersisted.get(auction_id) {
            return Lookup::Unpersisted(outcome.clone());
        }
        Lookup::Live(
            rooms
                .live
                .entry(auction_id.to_string())
                .or_default()
                .clone(),
        )
    }

    async fn retry_outcome(&self, outcome: &SettlementOutcome) {
        match bounded(self.store.write_outcome(outcome)).await {
            Ok(()) => {
                self.rooms.lock().unpersisted.remove(&outcome.auction_id);
                info!("Persisted held outcome for auction {}", outcome.auction_id);
            }
            Err(e) => warn!(
                "Outcome for auction {} still not persisted: {}",
                outcome.auction_id, e
            ),
        }
    }

    /// Drop a finished coordinator's slot, holding its outcome if unwritten.
    fn reap(&self, auction_id: &str, slot: &RoomSlot, unpersisted: Option<SettlementOutcome>) {
        let mut rooms = self.rooms.lock();
        rooms.remove_live(auction_id, slot);
        if let Some(outcome) = unpersisted {
            warn!(
                "Holding unwritten outcome for auction {} until the store recovers",
                auction_id
            );
            rooms.unpersisted.insert(auction_id.to_string(), outcome);
        }
    }

    async fn spawn_room(
        self: &Arc<Self>,
        auction_id: &str,
        slot: &RoomSlot,
    ) -> RoomResult<CoordinatorHandle> {
        let (handle, task) =
            AuctionCoordinator::start(auction_id, self.store.clone(), self.clock.clone()).await?;

        let registry: Weak<Self> = Arc::downgrade(self);
        let slot = Arc::clone(slot);
        let auction_id = auction_id.to_string();
        tokio::spawn(async move {
            let unpersisted = task.await.unwrap_or_else(|e| {
                error!("Coordinator for auction {} aborted: {}", auction_id, e);
                None
            });
            if let Some(registry) = registry.upgrade() {
                registry.reap(&auction_id, &slot, unpersisted);
                debug!("Reaped coordinator for auction {}", auction_id);
            }
        });

        Ok(handle)
    }
}

impl Rooms {
    fn remove_live(&mut self, auction_id: &str, slot: &RoomSlot) {
        if self.live.get(auction_id).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            self.live.remove(auction_id);
        }
    }
}
