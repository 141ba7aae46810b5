//! Nullable infrastructure for deterministic testing.
//!
//! Everything the refresh engine touches outside the process (the ledger,
//! the clock, the refresh schedule) sits behind a trait. This crate provides
//! test implementations that:
//! - Return scripted values
//! - Can be changed between cycles from the test
//! - Never touch the network or wall-clock time
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod ticker;

pub use clock::NullClock;
pub use ledger::{json_entry, NullLedgerClient};
pub use ticker::NullTicker;
