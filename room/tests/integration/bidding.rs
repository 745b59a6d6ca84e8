//! Bid ordering, validation and fan-out.

use auction_room::ServerFrame;

use crate::common::{accepted, expect_update, rejected, RoomHarness};

const T0: u64 = 1_704_067_200_000;

#[tokio::test]
async fn test_competing_bidders_scenario() {
    let harness = RoomHarness::new();
    harness.seed("lot-1", 1000.0, 60);

    let (mut alice, initial) = harness.connect("lot-1").await;
    let (mut bob, _) = harness.connect("lot-1").await;
    let (mut carol, _) = harness.connect("lot-1").await;
    let (mut watcher, _) = harness.connect("lot-1").await;
    assert_eq!(initial.current_price, 1000.0);
    assert_eq!(initial.end_time, T0 + 60_000);

    harness.time.set(T0 + 10_000);
    assert_eq!(harness.bid(&mut alice, "alice", 1200.0).await, accepted());
    let update = expect_update(alice.client.next_frame().await);
    assert_eq!(update.current_price, 1200.0);
    assert_eq!(update.highest_bidder.as_deref(), Some("alice"));
    assert_eq!(update.end_time, T0 + 60_000);
    assert_eq!(update.total_bids, 1);
    assert_eq!(expect_update(bob.client.next_frame().await), update);
    assert_eq!(expect_update(carol.client.next_frame().await), update);
    assert_eq!(expect_update(watcher.client.next_frame().await), update);

    harness.time.set(T0 + 20_000);
    assert_eq!(
        harness.bid(&mut bob, "bob", 1100.0).await,
        rejected("Bid must be higher than 1200")
    );

    harness.time.set(T0 + 45_000);
    assert_eq!(harness.bid(&mut carol, "carol", 1500.0).await, accepted());
    let update = expect_update(carol.client.next_frame().await);
    assert_eq!(update.current_price, 1500.0);
    assert_eq!(update.highest_bidder.as_deref(), Some("carol"));
    assert_eq!(update.end_time, T0 + 90_000);
    assert_eq!(update.total_bids, 2);

    // The rejected bid produced nothing for anyone else.
    assert_eq!(expect_update(watcher.client.next_frame().await), update);
    assert_eq!(expect_update(alice.client.next_frame().await), update);
    assert_eq!(expect_update(bob.client.next_frame().await), update);

    harness.settle("lot-1").await;
    assert_eq!(
        watcher.client.next_frame().await,
        ServerFrame::AuctionEnded {
            data: auction_room::auction::AuctionEndedData {
                final_price: 1500.0,
                winner: Some("carol".into()),
            },
        }
    );

    let row = harness.store.backing().auction("lot-1").unwrap();
    assert_eq!(row.current_price, Some(1500.0));
    assert_eq!(row.highest_bidder_id.as_deref(), Some("carol"));
    assert_eq!(row.total_bids, 2);

    let ledger = harness.store.backing().ledger_for("lot-1");
    let bids: Vec<_> = ledger
        .iter()
        .map(|e| (e.bidder_id.as_str(), e.amount))
        .collect();
    assert_eq!(bids, vec![("alice", 1200.0), ("carol", 1500.0)]);
}

#[tokio::test]
async fn test_late_joiner_sees_current_totals() {
    let harness = RoomHarness::new();
    harness.seed("lot-2", 50.0, 3600);

    let (mut early, snapshot) = harness.connect("lot-2").await;
    assert_eq!(snapshot.total_bids, 0);
    assert!(snapshot.highest_bidder.is_none());

    for (i, amount) in [60.0, 75.0, 90.0].into_iter().enumerate() {
        assert_eq!(harness.bid(&mut early, "early", amount).await, accepted());
        assert_eq!(
            expect_update(early.client.next_frame().await).total_bids,
            i as u64 + 1
        );
    }

    let (_late, snapshot) = harness.connect("lot-2").await;
    assert_eq!(snapshot.total_bids, 3);
    assert_eq!(snapshot.current_price, 90.0);
    assert_eq!(snapshot.highest_bidder.as_deref(), Some("early"));
}

#[tokio::test]
async fn test_equal_bid_is_too_low() {
    let harness = RoomHarness::new();
    harness.seed("lot-3", 100.0, 3600);
    let (mut bidder, _) = harness.connect("lot-3").await;

    assert_eq!(
        harness.bid(&mut bidder, "dave", 100.0).await,
        rejected("Bid must be higher than 100")
    );
    assert_eq!(harness.bid(&mut bidder, "dave", 100.5).await, accepted());
    expect_update(bidder.client.next_frame().await);

    assert_eq!(
        harness.bid(&mut bidder, "erin", 100.5).await,
        rejected("Bid must be higher than 100.5")
    );
}

#[tokio::test]
async fn test_invalid_inputs_are_rejected_without_side_effects() {
    let harness = RoomHarness::new();
    harness.seed("lot-4", 10.0, 3600);
    let (mut bidder, _) = harness.connect("lot-4").await;

    let empty = harness.bid(&mut bidder, "", 20.0).await;
    assert!(matches!(empty, ServerFrame::BidResult { success: false, .. }));

    let negative = harness.bid(&mut bidder, "frank", -5.0).await;
    assert!(matches!(negative, ServerFrame::BidResult { success: false, .. }));

    bidder.client.send_text(r#"{"type":"bid","userId":"frank"}"#);
    assert_eq!(
        bidder.client.next_frame().await,
        ServerFrame::Error {
            message: "Invalid message".into(),
        }
    );

    let snapshot = harness.handle("lot-4").await.snapshot().await.unwrap();
    assert_eq!(snapshot.total_bids, 0);
    assert_eq!(snapshot.current_price, 10.0);
    assert!(bidder.client.is_idle());
}

#[tokio::test]
async fn test_bid_at_deadline_is_rejected() {
    let harness = RoomHarness::new();
    harness.seed("lot-5", 10.0, 60);
    let (mut bidder, _) = harness.connect("lot-5").await;

    harness.time.set(T0 + 60_000);
    assert_eq!(
        harness.bid(&mut bidder, "gina", 20.0).await,
        rejected("Auction has ended")
    );
}

#[tokio::test]
async fn test_prior_bid_count_carries_over() {
    let harness = RoomHarness::new();
    let mut record = auction_room::mocks::make_test_record("lot-6", 10.0, T0, 60_000);
    record.current_price = Some(40.0);
    record.highest_bidder_id = Some("henry".into());
    record.total_bids = 5;
    harness.store.backing().insert(record);

    let (mut bidder, snapshot) = harness.connect("lot-6").await;
    assert_eq!(snapshot.total_bids, 5);
    assert_eq!(snapshot.current_price, 40.0);

    assert_eq!(harness.bid(&mut bidder, "ivy", 45.0).await, accepted());
    assert_eq!(expect_update(bidder.client.next_frame().await).total_bids, 6);
}
