//! Nullable ledger: scripted responses instead of network calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use acme_client::{DataEntry, EntrySet, LedgerClient, LedgerClientError, TokenIssuerInfo};
use acme_types::url::identity_key;

/// Build a data entry whose first segment is `json`, hex-encoded the way
/// the ledger returns it.
pub fn json_entry(entry_hash: &str, json: &str) -> DataEntry {
    DataEntry {
        entry_hash: entry_hash.to_string(),
        data: vec![hex::encode(json)],
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    entry_sets: HashMap<String, Vec<DataEntry>>,
    issuers: HashMap<String, TokenIssuerInfo>,
    balances: HashMap<String, String>,
    entry_set_queries: usize,
    issuer_queries: usize,
    balance_queries: usize,
}

/// A test ledger holding data sets, token issuers, and balances in memory.
///
/// URLs are matched case-insensitively. Anything not scripted answers with
/// [`LedgerClientError::Unreachable`]. Clones share state, so a test can
/// keep a handle and change the ledger between cycles.
#[derive(Clone, Debug, Default)]
pub struct NullLedgerClient {
    state: Arc<Mutex<LedgerState>>,
}

impl NullLedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_entries(self, url: &str, entries: Vec<DataEntry>) -> Self {
        self.set_entries(url, entries);
        self
    }

    pub fn with_token_issuer(self, info: TokenIssuerInfo) -> Self {
        self.set_token_issuer(info);
        self
    }

    pub fn with_balance(self, url: &str, raw: &str) -> Self {
        self.set_balance(url, raw);
        self
    }

    pub fn set_entries(&self, url: &str, entries: Vec<DataEntry>) {
        self.state().entry_sets.insert(identity_key(url), entries);
    }

    /// Append an entry to a data set, creating the set if needed.
    pub fn push_entry(&self, url: &str, entry: DataEntry) {
        self.state()
            .entry_sets
            .entry(identity_key(url))
            .or_default()
            .push(entry);
    }

    /// Make the data set unreachable.
    pub fn clear_entries(&self, url: &str) {
        self.state().entry_sets.remove(&identity_key(url));
    }

    pub fn set_token_issuer(&self, info: TokenIssuerInfo) {
        self.state().issuers.insert(identity_key(&info.url), info);
    }

    pub fn clear_token_issuer(&self, url: &str) {
        self.state().issuers.remove(&identity_key(url));
    }

    pub fn set_balance(&self, url: &str, raw: &str) {
        self.state()
            .balances
            .insert(identity_key(url), raw.to_string());
    }

    pub fn clear_balance(&self, url: &str) {
        self.state().balances.remove(&identity_key(url));
    }

    /// Number of `fetch_entry_set` calls so far.
    pub fn entry_set_queries(&self) -> usize {
        self.state().entry_set_queries
    }

    /// Number of `fetch_token_issuer` calls so far.
    pub fn issuer_queries(&self) -> usize {
        self.state().issuer_queries
    }

    /// Number of `fetch_account_balance` calls so far.
    pub fn balance_queries(&self) -> usize {
        self.state().balance_queries
    }
}

fn not_found(url: &str) -> LedgerClientError {
    LedgerClientError::Unreachable(format!("{url}: not scripted"))
}

impl LedgerClient for NullLedgerClient {
    async fn fetch_entry_set(
        &self,
        url: &str,
        start: u64,
        count: u64,
        _expand: bool,
    ) -> Result<EntrySet, LedgerClientError> {
        let mut state = self.state();
        state.entry_set_queries += 1;
        let entries = state
            .entry_sets
            .get(&identity_key(url))
            .ok_or_else(|| not_found(url))?;
        let total = entries.len() as u64;
        let from = start.min(total) as usize;
        let to = start.saturating_add(count).min(total) as usize;
        Ok(EntrySet {
            entries: entries[from..to].to_vec(),
            total,
        })
    }

    async fn fetch_token_issuer(&self, url: &str) -> Result<TokenIssuerInfo, LedgerClientError> {
        let mut state = self.state();
        state.issuer_queries += 1;
        state
            .issuers
            .get(&identity_key(url))
            .cloned()
            .ok_or_else(|| not_found(url))
    }

    async fn fetch_account_balance(&self, url: &str) -> Result<String, LedgerClientError> {
        let mut state = self.state();
        state.balance_queries += 1;
        state
            .balances
            .get(&identity_key(url))
            .cloned()
            .ok_or_else(|| not_found(url))
    }
}
