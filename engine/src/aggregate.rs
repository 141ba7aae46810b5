//! Category counts and validator rollups, derived from the record set.
//!
//! Nothing here is stored across cycles: both views are recomputed from the
//! records of whichever snapshot is being read.

use serde::Serialize;

use acme_types::url::{eq_url, strip_scheme};
use acme_types::{RecordType, StakingRecord, Validator};

/// Number of records per staking type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub core_validator: u64,
    pub core_follower: u64,
    pub staking_validator: u64,
    pub delegated: u64,
    pub pure: u64,
}

/// Tally records by type.
pub fn category_counts(records: &[StakingRecord]) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for record in records {
        let slot = match record.record_type {
            RecordType::CoreValidator => &mut counts.core_validator,
            RecordType::CoreFollower => &mut counts.core_follower,
            RecordType::StakingValidator => &mut counts.staking_validator,
            RecordType::Delegated => &mut counts.delegated,
            RecordType::Pure => &mut counts.pure,
        };
        *slot += 1;
    }
    counts
}

/// Validators with their delegated stake, plus what could not be attributed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rollup {
    /// One entry per validator-type record, in record order.
    pub validators: Vec<Validator>,
    /// Delegations whose delegate is unknown or not accepting delegates.
    pub orphaned_delegations: usize,
    /// Sum of the balances of those delegations.
    pub orphaned_delegation_balance: i64,
}

/// Resolve a delegate against the validator set: exact case-insensitive
/// match first, then a match ignoring the `acc://` prefix.
fn resolve_delegate(validators: &[Validator], delegate: &str) -> Option<usize> {
    if delegate.is_empty() {
        return None;
    }
    validators
        .iter()
        .position(|v| eq_url(&v.identity, delegate))
        .or_else(|| {
            let bare = strip_scheme(delegate);
            validators
                .iter()
                .position(|v| eq_url(strip_scheme(&v.identity), bare))
        })
}

/// Build validator views and add accepted delegations to `total_staked`.
pub fn rollup(records: &[StakingRecord]) -> Rollup {
    let mut validators: Vec<Validator> = records
        .iter()
        .filter(|r| r.record_type.is_validator())
        .map(Validator::from)
        .collect();

    let mut orphaned_delegations = 0;
    let mut orphaned_delegation_balance = 0i64;

    for delegation in records
        .iter()
        .filter(|r| r.record_type == RecordType::Delegated)
    {
        match resolve_delegate(&validators, &delegation.delegate) {
            Some(i) if validators[i].accepts_delegates() => {
                let validator = &mut validators[i];
                validator.total_staked = validator
                    .total_staked
                    .saturating_add(delegation.balance.max(0));
            }
            _ => {
                orphaned_delegations += 1;
                orphaned_delegation_balance =
                    orphaned_delegation_balance.saturating_add(delegation.balance);
            }
        }
    }

    Rollup {
        validators,
        orphaned_delegations,
        orphaned_delegation_balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(identity: &str, balance: i64, accepting: &str) -> StakingRecord {
        StakingRecord {
            record_type: RecordType::CoreValidator,
            identity: identity.into(),
            stake_account: format!("{identity}/stake"),
            rewards_account: format!("{identity}/rewards"),
            accepting_delegates: accepting.into(),
            balance,
            ..Default::default()
        }
    }

    fn delegation(identity: &str, delegate: &str, balance: i64) -> StakingRecord {
        StakingRecord {
            record_type: RecordType::Delegated,
            identity: identity.into(),
            stake_account: format!("{identity}/stake"),
            rewards_account: format!("{identity}/rewards"),
            delegate: delegate.into(),
            balance,
            ..Default::default()
        }
    }

    #[test]
    fn counts_partition_every_record() {
        let mut pure = validator("acc://p.acme", 0, "");
        pure.record_type = RecordType::Pure;
        let mut follower = validator("acc://f.acme", 0, "");
        follower.record_type = RecordType::CoreFollower;
        let mut staking = validator("acc://s.acme", 0, "");
        staking.record_type = RecordType::StakingValidator;

        let records = vec![
            validator("acc://v.acme", 0, "yes"),
            follower,
            staking,
            delegation("acc://d1.acme", "acc://v.acme", 0),
            delegation("acc://d2.acme", "acc://v.acme", 0),
            pure,
        ];
        assert_eq!(
            category_counts(&records),
            CategoryCounts {
                core_validator: 1,
                core_follower: 1,
                staking_validator: 1,
                delegated: 2,
                pure: 1,
            }
        );
    }

    #[test]
    fn accepted_delegations_add_to_total_staked() {
        let records = vec![
            validator("acc://v.acme", 1_000, "yes"),
            delegation("acc://d1.acme", "acc://V.acme", 200),
            delegation("acc://d2.acme", "v.acme", 30),
            delegation("acc://d3.acme", "acc://v.acme", 4),
        ];
        let rollup = rollup(&records);
        assert_eq!(rollup.validators.len(), 1);
        assert_eq!(rollup.validators[0].balance, 1_000);
        assert_eq!(rollup.validators[0].total_staked, 1_234);
        assert_eq!(rollup.orphaned_delegations, 0);
    }

    #[test]
    fn non_accepting_and_unknown_delegates_are_orphaned() {
        let records = vec![
            validator("acc://closed.acme", 500, "no"),
            validator("acc://open.acme", 100, "yes"),
            delegation("acc://d1.acme", "acc://closed.acme", 50),
            delegation("acc://d2.acme", "acc://nobody.acme", 7),
            delegation("acc://d3.acme", "", 3),
            delegation("acc://d4.acme", "acc://open.acme", 1),
        ];
        let rollup = rollup(&records);
        assert_eq!(rollup.validators[0].total_staked, 500);
        assert_eq!(rollup.validators[1].total_staked, 101);
        assert_eq!(rollup.orphaned_delegations, 3);
        assert_eq!(rollup.orphaned_delegation_balance, 60);
    }

    #[test]
    fn delegations_to_delegated_records_do_not_count() {
        let records = vec![
            delegation("acc://a.acme", "acc://b.acme", 10),
            delegation("acc://b.acme", "acc://a.acme", 20),
        ];
        let rollup = rollup(&records);
        assert!(rollup.validators.is_empty());
        assert_eq!(rollup.orphaned_delegation_balance, 30);
    }

    #[test]
    fn total_staked_never_below_own_balance() {
        let records = vec![
            validator("acc://v.acme", 10, "yes"),
            delegation("acc://d.acme", "acc://v.acme", -5),
        ];
        let rollup = rollup(&records);
        assert_eq!(rollup.validators[0].total_staked, 10);
    }

    #[test]
    fn first_matching_validator_wins() {
        let mut second = validator("acc://v.acme", 70, "yes");
        second.stake_account = "acc://v.acme/second".into();
        let records = vec![
            validator("acc://v.acme", 30, "yes"),
            second,
            delegation("acc://d.acme", "acc://v.acme", 5),
        ];
        let rollup = rollup(&records);
        assert_eq!(rollup.validators[0].total_staked, 35);
        assert_eq!(rollup.validators[1].total_staked, 70);
    }
}
