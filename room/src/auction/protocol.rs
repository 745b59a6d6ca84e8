//! JSON wire frames exchanged with bidders over the WebSocket.

use serde::{Deserialize, Serialize};

use super::state::AuctionSnapshot;
use crate::config::MAX_FRAME_BYTES;
use crate::error::{RoomError, RoomResult};

/// Commands a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Bid {
        #[serde(rename = "userId")]
        user_id: String,
        amount: f64,
    },
}

impl ClientCommand {
    /// Parse an inbound text frame, rejecting oversized payloads first.
    pub fn parse(text: &str) -> RoomResult<Self> {
        if text.len() > MAX_FRAME_BYTES {
            return Err(RoomError::Serialization(format!(
                "frame too large: {} bytes (max {MAX_FRAME_BYTES})",
                text.len()
            )));
        }
        Ok(serde_json::from_str(text)?)
    }
}

/// Final result carried by `auction_ended`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionEndedData {
    pub final_price: f64,
    pub winner: Option<String>,
}

/// Frames the coordinator sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Full snapshot, sent once right after a session attaches.
    AuctionState { data: AuctionSnapshot },
    /// Broadcast after every accepted bid.
    AuctionUpdate { data: AuctionSnapshot },
    /// Outcome of the sender's own bid; never broadcast.
    BidResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Broadcast once at settlement, right before every session is closed.
    AuctionEnded { data: AuctionEndedData },
    /// Protocol error for the sender only.
    Error { message: String },
}

impl ServerFrame {
    pub fn bid_result<T>(result: &RoomResult<T>) -> Self {
        match result {
            Ok(_) => Self::BidResult {
                success: true,
                error: None,
            },
            Err(e) => Self::BidResult {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn to_json(&self) -> RoomResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
