/// Domain-specific error types for the auction room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Auction {0} not found")]
    AuctionNotFound(String),

    #[error("Settlement store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Auction has ended")]
    AuctionEnded,

    #[error("Bid must be higher than {current_price}")]
    BidTooLow { current_price: f64 },

    #[error("Invalid bid: {0}")]
    InvalidBid(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RoomError {
    /// Validation failures are reported to the submitting bidder and leave
    /// the auction untouched.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AuctionEnded | Self::BidTooLow { .. } | Self::InvalidBid(_)
        )
    }
}

impl From<serde_json::Error> for RoomError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Convenience type alias.
pub type RoomResult<T> = Result<T, RoomError>;
