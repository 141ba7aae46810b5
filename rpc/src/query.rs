//! Read-side operations over one snapshot: supply figures, sorting,
//! paginated listings, and point lookups.

use std::cmp::Ordering;

use serde::Serialize;

use acme_engine::{category_counts, rollup, CategoryCounts};
use acme_store::Snapshot;
use acme_types::url::eq_url;
use acme_types::{StakingRecord, Token, Validator};

use crate::error::ApiError;
use crate::pagination::{paginate, Page, PageParams, SortOrder};

/// Supply figures. Raw amounts are base units; `*_tokens` are whole tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyView {
    pub symbol: String,
    pub precision: u32,
    pub issued: i64,
    pub supply_limit: i64,
    pub staked: i64,
    pub circulating: i64,
    pub total_tokens: i64,
    pub max_tokens: i64,
    pub staked_tokens: i64,
    pub circulating_tokens: i64,
    pub updated_at: u64,
}

/// Single-figure supply responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplyFilter {
    Total,
    Max,
    Circulating,
    Staked,
}

impl SupplyFilter {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(Self::Total),
            "max" => Ok(Self::Max),
            "circulating" => Ok(Self::Circulating),
            "staked" => Ok(Self::Staked),
            _ => Err(ApiError::UnknownFilter(raw.to_string())),
        }
    }
}

impl SupplyView {
    /// The whole-token figure a filter selects.
    pub fn scalar(&self, filter: SupplyFilter) -> i64 {
        match filter {
            SupplyFilter::Total => self.total_tokens,
            SupplyFilter::Max => self.max_tokens,
            SupplyFilter::Circulating => self.circulating_tokens,
            SupplyFilter::Staked => self.staked_tokens,
        }
    }
}

/// Supply figures for the snapshot, or [`ApiError::SupplyUnavailable`] if no
/// supply query has succeeded yet.
///
/// Circulating is issued minus the foundation balance, floored at zero.
/// Staked is the sum of every staking record's balance.
pub fn supply(snapshot: &Snapshot) -> Result<SupplyView, ApiError> {
    let info = snapshot.supply().ok_or(ApiError::SupplyUnavailable)?;
    let issued = info
        .issued()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let supply_limit = info
        .supply_limit()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let staked = snapshot.total_staked();
    let circulating = issued
        .saturating_sub(snapshot.foundation_total_balance())
        .max(0);

    Ok(SupplyView {
        symbol: info.symbol.clone(),
        precision: info.precision,
        issued,
        supply_limit,
        staked,
        circulating,
        total_tokens: info.to_tokens(issued),
        max_tokens: info.to_tokens(supply_limit),
        staked_tokens: info.to_tokens(staked),
        circulating_tokens: info.to_tokens(circulating),
        updated_at: snapshot.updated_at().as_secs(),
    })
}

pub fn staking_summary(snapshot: &Snapshot) -> CategoryCounts {
    category_counts(snapshot.staking_records())
}

/// Keys a list can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Balance,
    Identity,
    TotalStaked,
}

impl SortKey {
    /// `None` for absent or unknown keys, meaning natural order.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw?.trim().to_ascii_lowercase().as_str() {
            "balance" => Some(Self::Balance),
            "identity" => Some(Self::Identity),
            "totalstaked" | "total_staked" => Some(Self::TotalStaked),
            _ => None,
        }
    }
}

/// Something a list endpoint can sort.
pub trait Sortable {
    fn balance(&self) -> i64;
    fn identity(&self) -> &str;
    /// `None` if the key does not apply to this type.
    fn total_staked(&self) -> Option<i64>;
}

impl Sortable for StakingRecord {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn total_staked(&self) -> Option<i64> {
        None
    }
}

impl Sortable for Validator {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn total_staked(&self) -> Option<i64> {
        Some(self.total_staked)
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

fn cmp_key<T: Sortable>(key: SortKey, a: &T, b: &T) -> Ordering {
    match key {
        SortKey::Balance => a.balance().cmp(&b.balance()),
        SortKey::Identity => cmp_ignore_case(a.identity(), b.identity()),
        SortKey::TotalStaked => a.total_staked().cmp(&b.total_staked()),
    }
}

/// Stable sort: items with equal keys keep their relative order in both
/// directions. No key leaves the input untouched.
pub fn sort_items<T: Sortable>(items: &mut [T], key: Option<SortKey>, order: SortOrder) {
    let Some(key) = key else { return };
    match order {
        SortOrder::Asc => items.sort_by(|a, b| cmp_key(key, a, b)),
        SortOrder::Desc => items.sort_by(|a, b| cmp_key(key, b, a)),
    }
}

pub fn stakers(
    snapshot: &Snapshot,
    page: PageParams,
    key: Option<SortKey>,
    order: SortOrder,
) -> Page<StakingRecord> {
    match key {
        None => paginate(snapshot.staking_records(), page),
        Some(_) => {
            let mut records = snapshot.staking_records().to_vec();
            sort_items(&mut records, key, order);
            paginate(&records, page)
        }
    }
}

pub fn validators(
    snapshot: &Snapshot,
    page: PageParams,
    key: Option<SortKey>,
    order: SortOrder,
) -> Page<Validator> {
    let mut validators = rollup(snapshot.staking_records()).validators;
    sort_items(&mut validators, key, order);
    paginate(&validators, page)
}

pub fn tokens(snapshot: &Snapshot, page: PageParams) -> Page<Token> {
    paginate(snapshot.tokens(), page)
}

/// First record whose stake account matches, with or without the scheme.
pub fn search_staker(snapshot: &Snapshot, stake_account: &str) -> Option<StakingRecord> {
    snapshot.find_by_stake_account(stake_account.trim()).cloned()
}

/// First validator with the given identity, case-insensitive.
pub fn search_validator(snapshot: &Snapshot, identity: &str) -> Option<Validator> {
    let identity = identity.trim();
    rollup(snapshot.staking_records())
        .validators
        .into_iter()
        .find(|v| eq_url(&v.identity, identity))
}

/// First token whose symbol or issuer matches, case-insensitive.
pub fn search_token(snapshot: &Snapshot, symbol: &str) -> Option<Token> {
    snapshot.find_token(symbol.trim()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acme_types::{RecordType, SupplyInfo, Timestamp};

    fn record(identity: &str, record_type: RecordType, balance: i64) -> StakingRecord {
        StakingRecord {
            record_type,
            identity: identity.into(),
            stake_account: format!("{identity}/stake"),
            rewards_account: format!("{identity}/rewards"),
            accepting_delegates: "yes".into(),
            balance,
            ..Default::default()
        }
    }

    fn snapshot(records: Vec<StakingRecord>, supply: Option<SupplyInfo>, foundation: i64) -> Snapshot {
        Snapshot::new(records, Vec::new(), supply, foundation, Timestamp::new(1_700_000_000))
    }

    fn acme_supply() -> SupplyInfo {
        SupplyInfo {
            issued_raw: "45000000000000000".into(),
            supply_limit_raw: "50000000000000000".into(),
            symbol: "ACME".into(),
            precision: 8,
        }
    }

    #[test]
    fn sort_desc_then_paginate() {
        let snap = snapshot(
            vec![
                record("A", RecordType::Pure, 10),
                record("B", RecordType::Pure, 20),
                record("C", RecordType::Pure, 5),
            ],
            None,
            0,
        );
        let all = stakers(
            &snap,
            PageParams { start: 0, count: 10 },
            Some(SortKey::Balance),
            SortOrder::Desc,
        );
        let ids: Vec<&str> = all.items.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, ["B", "A", "C"]);

        let page = stakers(
            &snap,
            PageParams { start: 1, count: 1 },
            Some(SortKey::Balance),
            SortOrder::Desc,
        );
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].identity, "A");
        assert_eq!(page.total, 3);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let mut records = vec![
            record("acc://x.acme", RecordType::Pure, 5),
            record("acc://y.acme", RecordType::Pure, 1),
            record("acc://z.acme", RecordType::Pure, 5),
            record("acc://w.acme", RecordType::Pure, 1),
        ];
        sort_items(&mut records, Some(SortKey::Balance), SortOrder::Desc);
        let ids: Vec<&str> = records.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, ["acc://x.acme", "acc://z.acme", "acc://y.acme", "acc://w.acme"]);

        sort_items(&mut records, Some(SortKey::Balance), SortOrder::Asc);
        let ids: Vec<&str> = records.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, ["acc://y.acme", "acc://w.acme", "acc://x.acme", "acc://z.acme"]);
    }

    #[test]
    fn identity_sort_ignores_case() {
        let mut records = vec![
            record("acc://Bravo.acme", RecordType::Pure, 0),
            record("acc://alpha.acme", RecordType::Pure, 0),
            record("acc://charlie.acme", RecordType::Pure, 0),
        ];
        sort_items(&mut records, SortKey::parse(Some("identity")), SortOrder::Asc);
        assert_eq!(records[0].identity, "acc://alpha.acme");
        assert_eq!(records[1].identity, "acc://Bravo.acme");
    }

    #[test]
    fn unknown_or_inapplicable_key_keeps_natural_order() {
        assert_eq!(SortKey::parse(Some("height")), None);
        assert_eq!(SortKey::parse(Some("totalStaked")), Some(SortKey::TotalStaked));

        let mut records = vec![
            record("acc://b.acme", RecordType::Pure, 1),
            record("acc://a.acme", RecordType::Pure, 2),
        ];
        sort_items(&mut records, Some(SortKey::TotalStaked), SortOrder::Desc);
        assert_eq!(records[0].identity, "acc://b.acme");
    }

    #[test]
    fn validators_sorted_by_total_staked() {
        let mut delegation = record("acc://d.acme", RecordType::Delegated, 100);
        delegation.delegate = "acc://small.acme".into();
        let snap = snapshot(
            vec![
                record("acc://big.acme", RecordType::CoreValidator, 50),
                record("acc://small.acme", RecordType::StakingValidator, 10),
                delegation,
            ],
            None,
            0,
        );
        let page = validators(&snap, PageParams::default(), Some(SortKey::TotalStaked), SortOrder::Desc);
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].identity, "acc://small.acme");
        assert_eq!(page.items[0].total_staked, 110);

        let found = search_validator(&snap, "ACC://SMALL.ACME").unwrap();
        assert_eq!(found.total_staked, 110);
        assert!(search_validator(&snap, "acc://d.acme").is_none());
    }

    #[test]
    fn supply_figures() {
        let snap = snapshot(
            vec![
                record("acc://a.acme", RecordType::CoreValidator, 30_000_000_000),
                record("acc://b.acme", RecordType::Delegated, 15_000_000_000),
            ],
            Some(acme_supply()),
            5_000_000_000_000_000,
        );
        let view = supply(&snap).unwrap();
        assert_eq!(view.issued, 45_000_000_000_000_000);
        assert_eq!(view.circulating, 40_000_000_000_000_000);
        assert_eq!(view.staked, 45_000_000_000);
        assert_eq!(view.total_tokens, 450_000_000);
        assert_eq!(view.max_tokens, 500_000_000);
        assert_eq!(view.circulating_tokens, 400_000_000);
        assert_eq!(view.staked_tokens, 450);
        assert_eq!(view.updated_at, 1_700_000_000);
        assert_eq!(view.scalar(SupplyFilter::parse("Circulating").unwrap()), 400_000_000);
        assert!(SupplyFilter::parse("market").is_err());
    }

    #[test]
    fn circulating_never_negative() {
        let snap = snapshot(Vec::new(), Some(acme_supply()), i64::MAX);
        assert_eq!(supply(&snap).unwrap().circulating, 0);
        assert!(matches!(
            supply(&snapshot(Vec::new(), None, 0)),
            Err(ApiError::SupplyUnavailable)
        ));
    }

    #[test]
    fn lookups_miss_quietly() {
        let snap = snapshot(vec![record("acc://a.acme", RecordType::Pure, 1)], None, 0);
        assert!(search_staker(&snap, "a.acme/stake").is_some());
        assert!(search_staker(&snap, "acc://zz.acme/stake").is_none());
        assert!(search_token(&snap, "ACME").is_none());
    }
}
