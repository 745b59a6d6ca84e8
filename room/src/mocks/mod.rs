//! Mock implementations for testing.
//!
//! Stand-ins for the store, the clock and the client socket so coordinators
//! and sessions can be driven without a database or a network.

pub mod socket;
pub mod store;
pub mod time;

pub use socket::{MockClient, MockSocket};
pub use store::{make_test_record, MockStore, MockStoreFailure};
pub use time::MockTime;
