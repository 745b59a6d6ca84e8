//! Auction domain: the bid/settlement state machine and the wire protocol.

pub mod protocol;
pub mod state;

pub use protocol::{AuctionEndedData, ClientCommand, ServerFrame};
pub use state::{AcceptedBid, AuctionSnapshot, AuctionState, BidEntry, Phase, Settlement};
