//! Tunable constants and command-line options for the auction room.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// A bid arriving this close to the deadline (milliseconds) triggers anti-snipe.
pub const ANTI_SNIPE_WINDOW_MS: u64 = 30_000;

/// Amount the deadline moves on every anti-snipe bid (milliseconds).
pub const ANTI_SNIPE_EXTENSION_MS: u64 = 30_000;

/// Most recent bids persisted to the ledger at settlement.
pub const SETTLEMENT_LEDGER_CAP: usize = 100;

/// Upper bound on each settlement write before it is abandoned.
pub const SETTLEMENT_WRITE_TIMEOUT_SECS: u64 = 10;

/// Capacity of the command queue in front of each coordinator.
pub const COORDINATOR_QUEUE_CAPACITY: usize = 256;

/// Outbound frames buffered per session before it counts as a failed target.
pub const SESSION_OUTBOUND_CAPACITY: usize = 64;

/// WebSocket close code sent to every session when the auction settles.
pub const AUCTION_ENDED_CLOSE_CODE: u16 = 1000;

/// WebSocket close reason sent alongside [`AUCTION_ENDED_CLOSE_CODE`].
pub const AUCTION_ENDED_CLOSE_REASON: &str = "Auction ended";

/// Message carried by `error` frames for unparseable input.
pub const INVALID_MESSAGE: &str = "Invalid message";

/// Maximum inbound frame size accepted from a bidder.
pub const MAX_FRAME_BYTES: usize = 16 * 1024;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8787";

/// Environment variable for the listen address override.
pub const BIND_ENV: &str = "AUCTION_ROOM_BIND";

/// Environment variable pointing at the JSON seed file of auction records.
pub const SEED_FILE_ENV: &str = "AUCTION_ROOM_SEED";

/// Runtime options for the `auction-room` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "auction-room")]
#[command(author, version, about, long_about = None)]
pub struct RoomArgs {
    /// Address to listen on
    #[arg(short, long, env = BIND_ENV, default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// JSON file with the auction records to serve
    #[arg(short, long, env = SEED_FILE_ENV)]
    pub seed_file: Option<PathBuf>,
}

/// Return the current Unix timestamp in milliseconds.
///
/// This is a convenience wrapper that avoids the boilerplate of
/// `SystemTimeProvider::new().now_unix_ms()` in production code paths.
/// For testable code, prefer accepting a `TimeProvider` parameter instead.
pub fn now_unix_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
