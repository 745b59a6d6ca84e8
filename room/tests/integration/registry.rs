//! Room lifecycle across many auctions and concurrent first connections.

use std::time::Duration;

use auction_room::mocks::MockStoreFailure;
use auction_room::RoomError;

use crate::common::{accepted, expect_update, RoomHarness};

#[tokio::test]
async fn test_simultaneous_first_connections_share_one_room() {
    let harness = RoomHarness::new();
    harness.seed("hot", 10.0, 3600);
    harness
        .store
        .set_load_delay(Some(Duration::from_millis(20)))
        .await;

    let (a, b, c) = tokio::join!(
        harness.connect("hot"),
        harness.connect("hot"),
        harness.connect("hot")
    );
    let (mut a, _) = a;
    let (mut b, _) = b;
    let (mut c, _) = c;
    assert_eq!(harness.store.load_count(), 1);

    assert_eq!(harness.bid(&mut a, "x", 11.0).await, accepted());
    let update = expect_update(a.client.next_frame().await);
    assert_eq!(expect_update(b.client.next_frame().await), update);
    assert_eq!(expect_update(c.client.next_frame().await), update);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let harness = RoomHarness::new();
    harness.seed("one", 10.0, 3600);
    harness.seed("two", 20.0, 3600);

    let first = harness.handle("one").await;
    let second = harness.handle("two").await;
    first.place_bid("x", 15.0).await.unwrap();

    assert_eq!(second.snapshot().await.unwrap().current_price, 20.0);
    assert_eq!(harness.registry.live_rooms(), 2);

    harness.settle("one").await;
    assert_eq!(harness.registry.live_rooms(), 1);
    assert!(second.place_bid("y", 25.0).await.is_ok());
}

#[tokio::test]
async fn test_outage_then_recovery() {
    let harness = RoomHarness::new();
    harness.seed("flaky", 10.0, 3600);
    harness.store.set_fail_mode(Some(MockStoreFailure::All)).await;

    for _ in 0..3 {
        assert!(matches!(
            harness.registry.open("flaky").await,
            Err(RoomError::StoreUnavailable(_))
        ));
    }
    assert_eq!(harness.registry.live_rooms(), 0);

    harness.store.set_fail_mode(None).await;
    let (_bidder, snapshot) = harness.connect("flaky").await;
    assert_eq!(snapshot.current_price, 10.0);
    assert_eq!(harness.store.load_count(), 4);
}

#[tokio::test]
async fn test_unknown_auction() {
    let harness = RoomHarness::new();
    assert!(matches!(
        harness.registry.open("nope").await,
        Err(RoomError::AuctionNotFound(id)) if id == "nope"
    ));
}
