//! Read-only HTTP query surface for the ledger mirror.
//!
//! Provides endpoints for:
//! - Token supply (issued, limit, staked, circulating)
//! - Staking category counts and the paginated staker list
//! - Validator rollups (own stake plus accepted delegations)
//! - The token registry
//! - Health and Prometheus metrics
//!
//! Every request loads the published snapshot once and answers from it;
//! the read path never waits on the ledger.

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod query;
pub mod server;

pub use error::ApiError;
pub use pagination::{paginate, Page, PageParams, SortOrder};
pub use query::{SortKey, SupplyFilter, SupplyView};
pub use server::{router, RpcServer, RpcState};
