//! Reconciliation and aggregation engine.
//!
//! One refresh cycle runs:
//! fetch → [`decode`] → [`reconcile`] → [`enrich`] → publish,
//! with [`aggregate`] deriving validator rollups and category counts from
//! the published records on demand.
//!
//! Per-entry and per-account failures are logged and skipped. A failed fetch
//! of a whole section keeps that section's data from the previous cycle.

pub mod aggregate;
pub mod decode;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod reconcile;
pub mod refresh;
pub mod scheduler;

pub use aggregate::{category_counts, rollup, CategoryCounts, Rollup};
pub use decode::{decode_staking, decode_token, entry_payload, DecodedStaking};
pub use enrich::{enrich_balances, fetch_supply, foundation_total, refresh_token_symbols, EnrichStats};
pub use error::{DecodeError, RefreshError};
pub use fetch::fetch_all_entries;
pub use reconcile::{apply_staking, reconcile_staking, reconcile_tokens, ReconcileStats};
pub use refresh::{CycleReport, RefreshConfig, RefreshService, TokenFeed};
pub use scheduler::IntervalTicker;
