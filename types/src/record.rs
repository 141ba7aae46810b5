//! Staking records in both on-chain encodings.
//!
//! The staking data account carries two incompatible payload shapes:
//! - the single-account form, one [`StakingRecord`] per entry;
//! - the multi-account form, one identity with an ordered list of
//!   [`SubAccount`]s, expanded into several records sharing that identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::url::eq_url;

/// Staking role of a record.
///
/// Anything not recognised on-chain is classified as [`RecordType::Pure`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordType {
    CoreValidator,
    CoreFollower,
    StakingValidator,
    Delegated,
    #[default]
    Pure,
}

impl RecordType {
    /// Classify an on-chain type string.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            s if s.eq_ignore_ascii_case("coreValidator") => Self::CoreValidator,
            s if s.eq_ignore_ascii_case("coreFollower") => Self::CoreFollower,
            s if s.eq_ignore_ascii_case("stakingValidator") => Self::StakingValidator,
            s if s.eq_ignore_ascii_case("delegated") => Self::Delegated,
            _ => Self::Pure,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoreValidator => "coreValidator",
            Self::CoreFollower => "coreFollower",
            Self::StakingValidator => "stakingValidator",
            Self::Delegated => "delegated",
            Self::Pure => "pure",
        }
    }

    /// Whether records of this type appear in the validator rollup.
    pub fn is_validator(&self) -> bool {
        matches!(
            self,
            Self::CoreValidator | Self::CoreFollower | Self::StakingValidator
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered stake position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub status: String,
    /// Case-insensitive key within a snapshot.
    pub identity: String,
    #[serde(rename = "stake")]
    pub stake_account: String,
    #[serde(rename = "rewards")]
    pub rewards_account: String,
    pub delegate: String,
    pub accepting_delegates: String,
    /// Hash of the ledger entry this record was decoded from.
    #[serde(rename = "entryHash")]
    pub source_entry_hash: String,
    /// Stake account balance, filled by the enricher.
    pub balance: i64,
}

impl StakingRecord {
    /// `acceptingDelegates == "yes"`.
    pub fn accepts_delegates(&self) -> bool {
        self.accepting_delegates == "yes"
    }

    /// Replace this record's ledger-sourced fields with `update`.
    ///
    /// The stored identity spelling is kept. The balance survives only when
    /// the stake account is unchanged; a moved stake account starts from zero
    /// until the enricher fills it.
    pub fn overwrite_with(&mut self, update: StakingRecord) {
        let balance = if eq_url(&self.stake_account, &update.stake_account) {
            self.balance
        } else {
            0
        };
        let identity = std::mem::take(&mut self.identity);
        *self = StakingRecord {
            identity,
            balance,
            ..update
        };
    }
}

/// One sub-account of a multi-account entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccount {
    pub record_type: RecordType,
    pub stake_account: String,
    pub rewards_account: String,
    pub delegate: String,
    pub accepting_delegates: String,
}

/// The multi-account encoding: one identity, several stake positions.
///
/// Only exists during decode; see [`MultiAccountRecord::expand`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiAccountRecord {
    pub identity: String,
    pub status: String,
    pub accounts: Vec<SubAccount>,
}

impl MultiAccountRecord {
    /// Expand into one [`StakingRecord`] per sub-account, in order, all
    /// sharing the identity and the provenance hash.
    pub fn expand(self, entry_hash: &str) -> Vec<StakingRecord> {
        let MultiAccountRecord {
            identity,
            status,
            accounts,
        } = self;
        accounts
            .into_iter()
            .map(|sub| StakingRecord {
                record_type: sub.record_type,
                status: status.clone(),
                identity: identity.clone(),
                stake_account: sub.stake_account,
                rewards_account: sub.rewards_account,
                delegate: sub.delegate,
                accepting_delegates: sub.accepting_delegates,
                source_entry_hash: entry_hash.to_string(),
                balance: 0,
            })
            .collect()
    }
}
