pub mod harness;

#[allow(unused_imports)]
pub use harness::{accepted, expect_update, rejected, Bidder, RoomHarness};
