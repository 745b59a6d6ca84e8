//! Trait abstractions for dependency injection and testability.
//!
//! This module provides trait-based abstractions for external dependencies,
//! enabling unit testing without a real clock or a real database.

pub mod store;
pub mod time;

pub use store::{AuctionRecord, AuctionStatus, LedgerEntry, SettlementOutcome, SettlementStore};
pub use time::{SystemTimeProvider, TimeProvider};
