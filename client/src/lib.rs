//! Ledger access layer.
//!
//! The rest of the workspace depends only on the [`LedgerClient`] trait:
//! - `fetch_entry_set` pages through a data account's entries
//! - `fetch_token_issuer` reads a token issuer's supply and symbol
//! - `fetch_account_balance` reads a token account's balance
//!
//! [`AccumulateClient`] implements it over the ledger's JSON-RPC v2 API.
//! Retries are left to the caller's refresh schedule.

pub mod accumulate;
pub mod error;
pub mod types;

use std::future::Future;

pub use accumulate::AccumulateClient;
pub use error::LedgerClientError;
pub use types::{DataEntry, EntrySet, TokenIssuerInfo};

/// Read-only access to ledger state.
pub trait LedgerClient: Send + Sync {
    /// Fetch one page of a data account's entries. `total` in the result is
    /// the number of entries available, which may exceed the page.
    fn fetch_entry_set(
        &self,
        url: &str,
        start: u64,
        count: u64,
        expand: bool,
    ) -> impl Future<Output = Result<EntrySet, LedgerClientError>> + Send;

    /// Fetch a token issuer's metadata and supply.
    fn fetch_token_issuer(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<TokenIssuerInfo, LedgerClientError>> + Send;

    /// Fetch a token account's balance as a decimal string in base units.
    fn fetch_account_balance(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<String, LedgerClientError>> + Send;
}
