//! Fundamental types for the ACME staking metrics mirror.
//!
//! This crate defines the domain model shared across every other crate in the
//! workspace: staking records (single- and multi-account encodings), tokens,
//! supply info, derived validator views, ledger URLs, and the time seams
//! (clock + ticker) used by the refresh loop.

pub mod error;
pub mod record;
pub mod supply;
pub mod time;
pub mod token;
pub mod url;
pub mod validator;

pub use error::TypesError;
pub use record::{MultiAccountRecord, RecordType, StakingRecord, SubAccount};
pub use supply::SupplyInfo;
pub use time::{Clock, SystemClock, Ticker, Timestamp};
pub use token::Token;
pub use url::LedgerUrl;
pub use validator::Validator;
