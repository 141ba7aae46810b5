//! Derived validator view.

use serde::{Deserialize, Serialize};

use crate::StakingRecord;

/// A validator and the stake delegated to it.
///
/// Rebuilt from the staking records on demand; never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    pub identity: String,
    #[serde(rename = "stake")]
    pub stake_account: String,
    #[serde(rename = "rewards")]
    pub rewards_account: String,
    /// Own stake account balance.
    pub balance: i64,
    pub accepting_delegates: String,
    /// Own balance plus accepted delegations.
    pub total_staked: i64,
}

impl Validator {
    pub fn accepts_delegates(&self) -> bool {
        self.accepting_delegates == "yes"
    }
}

impl From<&StakingRecord> for Validator {
    fn from(record: &StakingRecord) -> Self {
        Self {
            identity: record.identity.clone(),
            stake_account: record.stake_account.clone(),
            rewards_account: record.rewards_account.clone(),
            balance: record.balance,
            accepting_delegates: record.accepting_delegates.clone(),
            total_staked: record.balance,
        }
    }
}
