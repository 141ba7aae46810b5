//! The immutable unit of publication.

use std::collections::HashMap;

use acme_types::url::{eq_url_loose, identity_key};
use acme_types::{StakingRecord, SupplyInfo, Timestamp, Token};

/// Everything derived from the ledger in one refresh cycle.
///
/// Built off to the side by the refresh task and never mutated after
/// construction. Validator rollups and category counts are not stored here;
/// they are derived from `staking_records` on demand.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    staking_records: Vec<StakingRecord>,
    tokens: Vec<Token>,
    supply: Option<SupplyInfo>,
    foundation_total_balance: i64,
    updated_at: Timestamp,
    /// Lowercased identity -> positions in `staking_records`, in order.
    identity_index: HashMap<String, Vec<usize>>,
}

impl Snapshot {
    pub fn new(
        staking_records: Vec<StakingRecord>,
        tokens: Vec<Token>,
        supply: Option<SupplyInfo>,
        foundation_total_balance: i64,
        updated_at: Timestamp,
    ) -> Self {
        let mut identity_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, record) in staking_records.iter().enumerate() {
            identity_index
                .entry(identity_key(&record.identity))
                .or_default()
                .push(pos);
        }
        Self {
            staking_records,
            tokens,
            supply,
            foundation_total_balance,
            updated_at,
            identity_index,
        }
    }

    /// The snapshot served before the first cycle completes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn staking_records(&self) -> &[StakingRecord] {
        &self.staking_records
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// `None` until a supply query has succeeded once.
    pub fn supply(&self) -> Option<&SupplyInfo> {
        self.supply.as_ref()
    }

    pub fn foundation_total_balance(&self) -> i64 {
        self.foundation_total_balance
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// All records for an identity (case-insensitive), in insertion order.
    /// More than one only for multi-account identities.
    pub fn records_for_identity(&self, identity: &str) -> Vec<&StakingRecord> {
        self.identity_index
            .get(&identity_key(identity))
            .map(|positions| positions.iter().map(|&i| &self.staking_records[i]).collect())
            .unwrap_or_default()
    }

    /// First record for an identity (case-insensitive).
    pub fn find_by_identity(&self, identity: &str) -> Option<&StakingRecord> {
        self.identity_index
            .get(&identity_key(identity))
            .and_then(|positions| positions.first())
            .map(|&i| &self.staking_records[i])
    }

    /// First record whose stake account matches, with or without the
    /// `acc://` prefix.
    pub fn find_by_stake_account(&self, stake_account: &str) -> Option<&StakingRecord> {
        self.staking_records
            .iter()
            .find(|r| eq_url_loose(&r.stake_account, stake_account))
    }

    /// First token whose symbol or issuer matches (case-insensitive).
    pub fn find_token(&self, query: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| {
            t.symbol.eq_ignore_ascii_case(query) || eq_url_loose(&t.token_issuer, query)
        })
    }

    /// Sum of all staking record balances.
    pub fn total_staked(&self) -> i64 {
        self.staking_records
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.balance))
    }
}
