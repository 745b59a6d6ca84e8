//! Auction room test harness.
//!
//! Wires a [`RoomRegistry`] to a mock store and a mock clock, and connects
//! in-memory bidders to it through the same session code the server uses.

use std::sync::Arc;

use auction_room::mocks::{make_test_record, MockClient, MockSocket, MockStore, MockTime};
use auction_room::{serve_session, AuctionSnapshot, CoordinatorHandle, RoomRegistry, ServerFrame};
use tokio::task::JoinHandle;

/// One connected bidder.
pub struct Bidder {
    pub client: MockClient,
    pub task: JoinHandle<()>,
}

/// Registry plus the mocks behind it.
pub struct RoomHarness {
    pub registry: Arc<RoomRegistry<MockStore, MockTime>>,
    pub store: MockStore,
    pub time: MockTime,
}

#[allow(dead_code)]
impl RoomHarness {
    pub fn new() -> Self {
        let time = MockTime::default_time();
        let store = MockStore::new();
        let registry = RoomRegistry::new(store.clone(), time.clone());
        Self {
            registry,
            store,
            time,
        }
    }

    /// Insert an active auction that ends `duration_secs` from now.
    pub fn seed(&self, auction_id: &str, start_price: f64, duration_secs: u64) {
        self.store.backing().insert(make_test_record(
            auction_id,
            start_price,
            self.time.get(),
            duration_secs * 1000,
        ));
    }

    pub async fn handle(&self, auction_id: &str) -> CoordinatorHandle {
        self.registry
            .open(auction_id)
            .await
            .expect("auction should open")
    }

    /// Connect a bidder and consume its initial `auction_state`.
    pub async fn connect(&self, auction_id: &str) -> (Bidder, AuctionSnapshot) {
        let handle = self.handle(auction_id).await;
        let (socket, mut client) = MockSocket::pair();
        let task = tokio::spawn(serve_session(socket, handle));
        match client.next_frame().await {
            ServerFrame::AuctionState { data } => (Bidder { client, task }, data),
            other => panic!("expected auction_state first, got {other:?}"),
        }
    }

    /// Bid through a connected bidder and return its `bid_result` frame.
    pub async fn bid(&self, bidder: &mut Bidder, user_id: &str, amount: f64) -> ServerFrame {
        bidder.client.bid(user_id, amount);
        bidder.client.next_frame().await
    }

    /// Settle the auction now and wait for its coordinator to exit.
    pub async fn settle(&self, auction_id: &str) {
        let handle = self.handle(auction_id).await;
        handle.fire_alarm().await.expect("alarm delivered");
        while !handle.is_closed() {
            tokio::task::yield_now().await;
        }
    }
}

/// Unwrap an `auction_update` frame.
#[allow(dead_code)]
pub fn expect_update(frame: ServerFrame) -> AuctionSnapshot {
    match frame {
        ServerFrame::AuctionUpdate { data } => data,
        other => panic!("expected auction_update, got {other:?}"),
    }
}

/// A successful `bid_result`.
#[allow(dead_code)]
pub fn accepted() -> ServerFrame {
    ServerFrame::BidResult {
        success: true,
        error: None,
    }
}

/// A failed `bid_result` with the given message.
#[allow(dead_code)]
pub fn rejected(message: &str) -> ServerFrame {
    ServerFrame::BidResult {
        success: false,
        error: Some(message.to_string()),
    }
}
