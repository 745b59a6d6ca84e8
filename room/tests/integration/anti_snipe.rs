//! Deadline extension and the settlement alarm, on tokio's paused clock.

use std::time::Duration;

use auction_room::{Phase, ServerFrame};

use crate::common::{accepted, expect_update, RoomHarness};

const T0: u64 = 1_704_067_200_000;

/// Advance both the tokio clock and the wall clock the room sees.
async fn advance(harness: &RoomHarness, secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
    harness.time.advance_secs(secs);
}

#[tokio::test(start_paused = true)]
async fn test_late_bid_pushes_the_alarm_back() {
    let harness = RoomHarness::new();
    harness.seed("snipe-1", 100.0, 60);
    let (mut bidder, _) = harness.connect("snipe-1").await;
    let handle = harness.handle("snipe-1").await;

    advance(&harness, 55).await;
    assert_eq!(harness.bid(&mut bidder, "mallory", 150.0).await, accepted());
    let update = expect_update(bidder.client.next_frame().await);
    assert_eq!(update.end_time, T0 + 90_000);

    // The first deadline passes without settling.
    advance(&harness, 30).await;
    assert_eq!(handle.status().await.unwrap().phase, Phase::Open);

    advance(&harness, 10).await;
    assert!(matches!(
        bidder.client.next_frame().await,
        ServerFrame::AuctionEnded { .. }
    ));
    assert_eq!(harness.store.outcome_write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_extensions_accumulate() {
    let harness = RoomHarness::new();
    harness.seed("snipe-2", 100.0, 60);
    let (mut bidder, _) = harness.connect("snipe-2").await;

    advance(&harness, 40).await;
    assert_eq!(harness.bid(&mut bidder, "a", 110.0).await, accepted());
    assert_eq!(
        expect_update(bidder.client.next_frame().await).end_time,
        T0 + 90_000
    );

    advance(&harness, 40).await;
    assert_eq!(harness.bid(&mut bidder, "b", 120.0).await, accepted());
    assert_eq!(
        expect_update(bidder.client.next_frame().await).end_time,
        T0 + 120_000
    );

    advance(&harness, 39).await;
    let snapshot = harness.handle("snipe-2").await.snapshot().await.unwrap();
    assert_eq!(snapshot.current_price, 120.0);

    advance(&harness, 2).await;
    assert!(matches!(
        bidder.client.next_frame().await,
        ServerFrame::AuctionEnded { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_early_bid_does_not_extend() {
    let harness = RoomHarness::new();
    harness.seed("snipe-3", 100.0, 60);
    let (mut bidder, _) = harness.connect("snipe-3").await;

    // Exactly at the window boundary: strictly greater is required.
    advance(&harness, 30).await;
    assert_eq!(harness.bid(&mut bidder, "a", 110.0).await, accepted());
    assert_eq!(
        expect_update(bidder.client.next_frame().await).end_time,
        T0 + 60_000
    );

    advance(&harness, 31).await;
    assert!(matches!(
        bidder.client.next_frame().await,
        ServerFrame::AuctionEnded { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_past_deadline_settles_on_open() {
    let harness = RoomHarness::new();
    harness.seed("stale", 100.0, 60);
    harness.time.set(T0 + 120_000);

    let handle = harness.handle("stale").await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    while !handle.is_closed() {
        tokio::task::yield_now().await;
    }
    assert_eq!(harness.store.outcome_write_count(), 1);
    assert_eq!(
        harness.store.backing().auction("stale").unwrap().current_price,
        Some(100.0)
    );
}
