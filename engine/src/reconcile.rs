//! Merge freshly fetched entries into the working copy of the previous
//! cycle's records.
//!
//! Entries are applied in fetch order against the working copy being built,
//! so two single-account entries for one identity in the same batch collapse
//! into the last one. A multi-account entry clobbers every record of its
//! identity and appends one record per sub-account.
//!
//! Balances follow stake accounts, not records: after the batch is applied,
//! every record whose stake account was known at the start of the pass gets
//! that account's balance back, however many times the batch rebuilt it.

use std::collections::HashMap;

use acme_client::DataEntry;
use acme_types::url::{eq_url, identity_key};
use acme_types::{StakingRecord, Token};

use crate::decode::{decode_staking, decode_token, entry_payload, DecodedStaking};

/// Outcome counts of one reconcile pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Entries seen.
    pub received: usize,
    /// Entries rejected by the decoder.
    pub rejected: usize,
    /// Records appended for identities not in the working copy.
    pub added: usize,
    /// Records overwritten in place.
    pub updated: usize,
    /// Multi-account entries applied.
    pub expanded: usize,
    /// Records dropped by multi-account clobbers or single-account collapse.
    pub removed: usize,
}

/// Reconcile staking feed entries into `working`.
pub fn reconcile_staking(working: &mut Vec<StakingRecord>, entries: &[DataEntry]) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    let carried = balances_by_stake_account(working);
    for entry in entries {
        stats.received += 1;
        let decoded = entry_payload(entry)
            .and_then(|payload| decode_staking(&payload, &entry.entry_hash));
        match decoded {
            Ok(decoded) => apply_staking(working, decoded, &mut stats),
            Err(e) => {
                stats.rejected += 1;
                tracing::warn!(entry_hash = %entry.entry_hash, error = %e, "skipping staking entry");
            }
        }
    }
    restore_balances(working, &carried);
    stats
}

fn balances_by_stake_account(records: &[StakingRecord]) -> HashMap<String, i64> {
    let mut balances = HashMap::with_capacity(records.len());
    for record in records {
        balances
            .entry(identity_key(&record.stake_account))
            .or_insert(record.balance);
    }
    balances
}

fn restore_balances(records: &mut [StakingRecord], carried: &HashMap<String, i64>) {
    for record in records {
        if let Some(&balance) = carried.get(&identity_key(&record.stake_account)) {
            record.balance = balance;
        }
    }
}

/// Apply one decoded staking entry to `working`.
pub fn apply_staking(
    working: &mut Vec<StakingRecord>,
    decoded: DecodedStaking,
    stats: &mut ReconcileStats,
) {
    match decoded {
        DecodedStaking::Multi { record, entry_hash } => {
            let identity = record.identity.clone();
            let previous: Vec<StakingRecord> = {
                let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(working)
                    .into_iter()
                    .partition(|r| eq_url(&r.identity, &identity));
                *working = rest;
                matching
            };
            stats.removed += previous.len();
            stats.expanded += 1;

            let mut expanded = record.expand(&entry_hash);
            // a sub-account whose stake account was already known keeps its
            // last balance until enrichment refreshes it
            for record in &mut expanded {
                if let Some(old) = previous
                    .iter()
                    .find(|p| eq_url(&p.stake_account, &record.stake_account))
                {
                    record.balance = old.balance;
                }
            }
            tracing::debug!(%identity, accounts = expanded.len(), replaced = previous.len(), "expanded multi-account staking entry");
            stats.added += expanded.len();
            working.extend(expanded);
        }
        DecodedStaking::Single(record) => {
            let mut matches = working
                .iter()
                .enumerate()
                .filter(|(_, r)| eq_url(&r.identity, &record.identity))
                .map(|(i, _)| i);
            match matches.next() {
                Some(first) => {
                    let extra: Vec<usize> = matches.collect();
                    tracing::debug!(identity = %record.identity, "updated staking record");
                    working[first].overwrite_with(record);
                    // leftover siblings of a former multi-account identity
                    for i in extra.into_iter().rev() {
                        working.remove(i);
                        stats.removed += 1;
                    }
                    stats.updated += 1;
                }
                None => {
                    tracing::debug!(identity = %record.identity, "added staking record");
                    working.push(record);
                    stats.added += 1;
                }
            }
        }
    }
}

/// Reconcile token feed entries into `working`, keyed by issuer.
pub fn reconcile_tokens(working: &mut Vec<Token>, entries: &[DataEntry]) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    for entry in entries {
        stats.received += 1;
        let token = match entry_payload(entry).and_then(|payload| decode_token(&payload)) {
            Ok(token) => token,
            Err(e) => {
                stats.rejected += 1;
                tracing::warn!(entry_hash = %entry.entry_hash, error = %e, "skipping token entry");
                continue;
            }
        };
        match working
            .iter_mut()
            .find(|t| eq_url(&t.token_issuer, &token.token_issuer))
        {
            Some(existing) => {
                existing.overwrite_with(token);
                stats.updated += 1;
            }
            None => {
                working.push(token);
                stats.added += 1;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use acme_types::RecordType;
    use std::collections::HashMap;

    fn entry(hash: &str, json: &str) -> DataEntry {
        DataEntry {
            entry_hash: hash.into(),
            data: vec![hex::encode(json)],
        }
    }

    fn single(identity: &str, record_type: &str, stake: &str) -> String {
        format!(
            r#"{{"type":"{record_type}","status":"registered","identity":"{identity}","stake":"{stake}","rewards":"{identity}/rewards"}}"#
        )
    }

    fn multi(identity: &str, stakes: &[&str]) -> String {
        let accounts: Vec<String> = stakes
            .iter()
            .map(|s| format!(r#"{{"type":"stakingValidator","stake":"{s}","rewards":"{identity}/rewards"}}"#))
            .collect();
        format!(
            r#"{{"identity":"{identity}","accounts":[{}]}}"#,
            accounts.join(",")
        )
    }

    fn group_sizes(records: &[StakingRecord]) -> HashMap<String, usize> {
        let mut groups = HashMap::new();
        for r in records {
            *groups.entry(r.identity.to_lowercase()).or_insert(0) += 1;
        }
        groups
    }

    #[test]
    fn appends_new_identities_in_fetch_order() {
        let mut working = Vec::new();
        let stats = reconcile_staking(
            &mut working,
            &[
                entry("h1", &single("acc://a.acme", "coreValidator", "acc://a.acme/s")),
                entry("h2", &single("acc://b.acme", "delegated", "acc://b.acme/s")),
            ],
        );
        assert_eq!(stats.added, 2);
        assert_eq!(working[0].identity, "acc://a.acme");
        assert_eq!(working[1].record_type, RecordType::Delegated);
        assert_eq!(working[1].source_entry_hash, "h2");
    }

    #[test]
    fn single_account_merge_is_idempotent_across_cycles() {
        let entries = [entry("h1", &single("acc://a.acme", "coreValidator", "acc://a.acme/s"))];
        let mut working = Vec::new();
        reconcile_staking(&mut working, &entries);
        working[0].balance = 42;

        let stats = reconcile_staking(&mut working, &entries);
        assert_eq!(working.len(), 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.added, 0);
        assert_eq!(working[0].balance, 42);
    }

    #[test]
    fn same_identity_in_one_batch_collapses_to_last() {
        let mut working = Vec::new();
        reconcile_staking(
            &mut working,
            &[
                entry("h1", &single("acc://a.acme", "coreValidator", "acc://a.acme/s")),
                entry("h2", &single("ACC://A.acme", "coreFollower", "acc://a.acme/s")),
            ],
        );
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].record_type, RecordType::CoreFollower);
        assert_eq!(working[0].source_entry_hash, "h2");
        assert_eq!(working[0].identity, "acc://a.acme");
    }

    #[test]
    fn multi_account_entry_clobbers_existing_records() {
        let mut working = vec![
            StakingRecord {
                identity: "acc://x.acme".into(),
                stake_account: "acc://x.acme/old".into(),
                balance: 7,
                ..Default::default()
            },
            StakingRecord {
                identity: "acc://y.acme".into(),
                stake_account: "acc://y.acme/s".into(),
                ..Default::default()
            },
            StakingRecord {
                identity: "acc://X.ACME".into(),
                stake_account: "acc://x.acme/keep".into(),
                balance: 9,
                ..Default::default()
            },
        ];

        let stats = reconcile_staking(
            &mut working,
            &[entry(
                "hm",
                &multi("acc://x.acme", &["acc://x.acme/keep", "acc://x.acme/new1", "acc://x.acme/new2"]),
            )],
        );

        assert_eq!(stats.removed, 2);
        assert_eq!(stats.expanded, 1);
        let x: Vec<_> = working
            .iter()
            .filter(|r| r.identity.eq_ignore_ascii_case("acc://x.acme"))
            .collect();
        assert_eq!(x.len(), 3);
        assert!(x.iter().all(|r| r.source_entry_hash == "hm"));
        assert!(x.iter().all(|r| r.stake_account != "acc://x.acme/old"));
        assert_eq!(x[0].balance, 9);
        assert_eq!(x[1].balance, 0);
        assert_eq!(working[0].identity, "acc://y.acme");
    }

    #[test]
    fn shrinking_multi_account_entry_drops_stale_sub_accounts() {
        let mut working = Vec::new();
        reconcile_staking(
            &mut working,
            &[entry("h1", &multi("acc://x.acme", &["acc://x.acme/a", "acc://x.acme/b"]))],
        );
        assert_eq!(working.len(), 2);

        reconcile_staking(
            &mut working,
            &[entry("h2", &multi("acc://x.acme", &["acc://x.acme/b"]))],
        );
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].stake_account, "acc://x.acme/b");
    }

    #[test]
    fn single_entry_replaces_former_multi_account_siblings() {
        let mut working = Vec::new();
        reconcile_staking(
            &mut working,
            &[entry("h1", &multi("acc://x.acme", &["acc://x.acme/a", "acc://x.acme/b"]))],
        );
        let stats = reconcile_staking(
            &mut working,
            &[entry("h2", &single("acc://x.acme", "coreValidator", "acc://x.acme/a"))],
        );
        assert_eq!(stats.removed, 1);
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].record_type, RecordType::CoreValidator);
    }

    #[test]
    fn replayed_history_keeps_sub_account_balances() {
        let entries = [
            entry("h1", &single("acc://x.acme", "coreValidator", "acc://x.acme/a")),
            entry("h2", &multi("acc://x.acme", &["acc://x.acme/a", "acc://x.acme/b"])),
        ];
        let mut working = Vec::new();
        reconcile_staking(&mut working, &entries);
        working[0].balance = 100;
        working[1].balance = 200;

        reconcile_staking(&mut working, &entries);
        assert_eq!(working.len(), 2);
        assert_eq!(working[0].balance, 100);
        assert_eq!(working[1].stake_account, "acc://x.acme/b");
        assert_eq!(working[1].balance, 200);
    }

    #[test]
    fn bad_entries_are_skipped_without_aborting() {
        let mut working = Vec::new();
        let stats = reconcile_staking(
            &mut working,
            &[
                entry("h1", "not json"),
                DataEntry {
                    entry_hash: "h2".into(),
                    data: vec!["zz".into()],
                },
                DataEntry {
                    entry_hash: "h3".into(),
                    data: vec![],
                },
                entry("h4", r#"{"type":"coreValidator","identity":"acc://a.acme"}"#),
                entry("h5", &single("acc://b.acme", "coreValidator", "acc://b.acme/s")),
            ],
        );
        assert_eq!(stats.received, 5);
        assert_eq!(stats.rejected, 4);
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].identity, "acc://b.acme");
    }

    #[test]
    fn groups_match_multi_fan_out_plus_singles() {
        let mut working = Vec::new();
        reconcile_staking(
            &mut working,
            &[
                entry("h1", &single("acc://a.acme", "coreValidator", "acc://a.acme/s")),
                entry("h2", &multi("acc://m.acme", &["acc://m.acme/1", "acc://m.acme/2", "acc://m.acme/3"])),
                entry("h3", &single("acc://b.acme", "delegated", "acc://b.acme/s")),
                entry("h4", &single("acc://A.acme", "coreValidator", "acc://a.acme/s")),
            ],
        );
        let groups = group_sizes(&working);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["acc://m.acme"], 3);
        assert_eq!(groups["acc://a.acme"], 1);
        assert_eq!(groups["acc://b.acme"], 1);
    }

    #[test]
    fn tokens_merge_by_issuer() {
        let mut tokens = vec![Token {
            token_issuer: "acc://wacme.acme".into(),
            symbol: "WACME".into(),
            name: "old".into(),
            ..Default::default()
        }];
        let stats = reconcile_tokens(
            &mut tokens,
            &[
                entry("t1", r#"{"tokenIssuer":"ACC://WACME.acme","name":"Wrapped ACME"}"#),
                entry("t2", r#"{"tokenIssuer":"acc://other.acme","symbol":"OTH"}"#),
                entry("t3", r#"{"tokenIssuer":"not-a-url","symbol":"BAD"}"#),
            ],
        );
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.added, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_issuer, "acc://wacme.acme");
        assert_eq!(tokens[0].symbol, "WACME");
        assert_eq!(tokens[0].name, "Wrapped ACME");
    }
}
