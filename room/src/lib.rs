//! Live auction rooms: one authoritative coordinator per auction, fed by
//! WebSocket sessions, with anti-snipe deadline extension and a single
//! settlement write when the auction closes.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod auction;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod store;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use auction::{AuctionSnapshot, AuctionState, ClientCommand, Phase, ServerFrame};
pub use config::RoomArgs;
pub use coordinator::{AuctionCoordinator, CoordinatorHandle, Outbound, RoomStatus, SessionId};
pub use error::{RoomError, RoomResult};
pub use registry::RoomRegistry;
pub use server::build_app;
pub use session::{serve_session, Session};
pub use store::MemoryStore;
pub use traits::{
    AuctionRecord, AuctionStatus, LedgerEntry, SettlementOutcome, SettlementStore,
    SystemTimeProvider, TimeProvider,
};
