//! The refresh cycle and the loop that drives it.
//!
//! A cycle deep-copies the published snapshot, reconciles the staking and
//! token feeds into the copy, re-queries supply and balances, and publishes
//! the result in one swap. Any failing section leaves its part of the
//! previous snapshot in place; the cycle itself never fails.

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::Instrument;

use acme_client::LedgerClient;
use acme_store::{Snapshot, SnapshotReader, SnapshotWriter};
use acme_types::{Clock, StakingRecord, Ticker, Token};

use crate::aggregate::rollup;
use crate::enrich::{enrich_balances, fetch_supply, foundation_total, refresh_token_symbols, EnrichStats};
use crate::fetch::fetch_all_entries;
use crate::reconcile::{reconcile_staking, reconcile_tokens, ReconcileStats};

/// Ledger locations read by each cycle.
#[derive(Clone, Debug)]
pub struct RefreshConfig {
    /// Data account holding the staking registration feed.
    pub staking_data_account: String,
    /// Data account holding the token registry feed. `None` disables tokens.
    pub token_data_account: Option<String>,
    /// Token issuer whose supply is reported.
    pub supply_token_issuer: String,
    /// Accounts whose balances are excluded from circulating supply.
    pub foundation_accounts: Vec<String>,
    /// Entries requested per data-set page.
    pub page_size: u64,
}

/// Outcome of the token section of a cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TokenFeed {
    /// No token data account is configured.
    #[default]
    Disabled,
    /// The fetch failed and the previous tokens were kept.
    Failed,
    Reconciled(ReconcileStats),
}

impl TokenFeed {
    pub fn stats(&self) -> Option<&ReconcileStats> {
        match self {
            Self::Reconciled(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// What one cycle did. A `None` staking section failed to fetch and kept
/// its previous records.
#[derive(Clone, Debug, Default)]
pub struct CycleReport {
    pub cycle: u64,
    pub staking: Option<ReconcileStats>,
    pub tokens: TokenFeed,
    pub supply_refreshed: bool,
    pub balances: EnrichStats,
    pub token_symbol_failures: usize,
    pub foundation_total_balance: i64,
    pub orphaned_delegation_balance: i64,
    pub records: usize,
    pub token_count: usize,
    pub elapsed: Duration,
}

/// Owns the snapshot writer; the only task that publishes.
pub struct RefreshService<C, K> {
    client: C,
    clock: K,
    writer: SnapshotWriter,
    config: RefreshConfig,
    cycles: u64,
}

impl<C: LedgerClient, K: Clock> RefreshService<C, K> {
    pub fn new(client: C, clock: K, writer: SnapshotWriter, config: RefreshConfig) -> Self {
        Self {
            client,
            clock,
            writer,
            config,
            cycles: 0,
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        self.writer.reader()
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Run one cycle and publish its snapshot.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let cycle = self.cycles;
        let span = tracing::info_span!("refresh_cycle", cycle);
        self.cycle(cycle).instrument(span).await
    }

    async fn cycle(&mut self, cycle: u64) -> CycleReport {
        let started = Instant::now();
        let previous = self.writer.current();
        let mut records: Vec<StakingRecord> = previous.staking_records().to_vec();
        let mut tokens: Vec<Token> = previous.tokens().to_vec();
        let mut supply = previous.supply().cloned();
        drop(previous);

        let page_size = self.config.page_size;

        let staking = match fetch_all_entries(&self.client, &self.config.staking_data_account, page_size).await {
            Ok(entries) => Some(reconcile_staking(&mut records, &entries)),
            Err(e) => {
                tracing::warn!(
                    account = %self.config.staking_data_account,
                    error = %e,
                    "staking feed fetch failed, keeping previous records"
                );
                None
            }
        };

        let token_stats = match &self.config.token_data_account {
            Some(account) => match fetch_all_entries(&self.client, account, page_size).await {
                Ok(entries) => TokenFeed::Reconciled(reconcile_tokens(&mut tokens, &entries)),
                Err(e) => {
                    tracing::warn!(%account, error = %e, "token feed fetch failed, keeping previous tokens");
                    TokenFeed::Failed
                }
            },
            None => TokenFeed::Disabled,
        };

        let supply_refreshed = match fetch_supply(&self.client, &self.config.supply_token_issuer).await {
            Ok(fresh) => {
                supply = Some(fresh);
                true
            }
            Err(e) => {
                tracing::warn!(
                    issuer = %self.config.supply_token_issuer,
                    error = %e,
                    "supply query failed, keeping previous supply"
                );
                false
            }
        };

        let balances = enrich_balances(&self.client, &mut records).await;
        let token_symbol_failures = refresh_token_symbols(&self.client, &mut tokens).await;
        let foundation_total_balance = foundation_total(&self.client, &self.config.foundation_accounts).await;
        let orphaned_delegation_balance = rollup(&records).orphaned_delegation_balance;

        let report = CycleReport {
            cycle,
            staking,
            tokens: token_stats,
            supply_refreshed,
            balances,
            token_symbol_failures,
            foundation_total_balance,
            orphaned_delegation_balance,
            records: records.len(),
            token_count: tokens.len(),
            elapsed: started.elapsed(),
        };

        self.writer.publish(Snapshot::new(
            records,
            tokens,
            supply,
            foundation_total_balance,
            self.clock.now(),
        ));

        tracing::info!(
            records = report.records,
            tokens = report.token_count,
            balance_failures = report.balances.failed,
            supply_refreshed,
            foundation_total_balance,
            orphaned_delegation_balance,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "refresh cycle published"
        );
        report
    }

    /// Run a cycle on every tick until `shutdown` fires.
    ///
    /// Shutdown is only observed between cycles; a cycle in progress always
    /// finishes and publishes. `observe` sees every report.
    pub async fn run<T, F>(mut self, mut ticker: T, mut shutdown: broadcast::Receiver<()>, mut observe: F)
    where
        T: Ticker,
        F: FnMut(&CycleReport) + Send,
    {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!(cycles = self.cycles, "refresh task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.run_cycle().await;
                    observe(&report);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acme_client::TokenIssuerInfo;
    use acme_nullables::{json_entry, NullClock, NullLedgerClient, NullTicker};
    use acme_store::snapshot_store;
    use tokio::sync::mpsc;

    const STAKING: &str = "acc://staking.acme/registered";
    const TOKENS: &str = "acc://staking.acme/tokens";
    const ISSUER: &str = "acc://ACME";

    fn config() -> RefreshConfig {
        RefreshConfig {
            staking_data_account: STAKING.into(),
            token_data_account: Some(TOKENS.into()),
            supply_token_issuer: ISSUER.into(),
            foundation_accounts: vec!["acc://foundation.acme/one".into()],
            page_size: 2,
        }
    }

    fn acme_issuer(issued: &str) -> TokenIssuerInfo {
        TokenIssuerInfo {
            url: ISSUER.into(),
            symbol: "ACME".into(),
            precision: 8,
            issued: issued.into(),
            supply_limit: "50000000000000000".into(),
        }
    }

    fn ledger() -> NullLedgerClient {
        NullLedgerClient::new()
            .with_entries(
                STAKING,
                vec![
                    json_entry(
                        "h1",
                        r#"{"type":"coreValidator","identity":"acc://alice.acme","stake":"acc://alice.acme/stake","rewards":"acc://alice.acme/rewards","acceptingDelegates":"yes"}"#,
                    ),
                    json_entry(
                        "h2",
                        r#"{"type":"delegated","identity":"acc://bob.acme","stake":"acc://bob.acme/stake","rewards":"acc://bob.acme/rewards","delegate":"acc://alice.acme"}"#,
                    ),
                    json_entry("h3", r#"{"garbage":true}"#),
                ],
            )
            .with_entries(
                TOKENS,
                vec![json_entry("t1", r#"{"tokenIssuer":"acc://wacme.acme","symbol":"old"}"#)],
            )
            .with_token_issuer(acme_issuer("1000"))
            .with_token_issuer(TokenIssuerInfo {
                url: "acc://wacme.acme".into(),
                symbol: "WACME".into(),
                ..Default::default()
            })
            .with_balance("acc://alice.acme/stake", "500")
            .with_balance("acc://bob.acme/stake", "70")
            .with_balance("acc://foundation.acme/one", "300")
    }

    #[tokio::test]
    async fn cycle_publishes_reconciled_snapshot() {
        let (writer, reader) = snapshot_store(Snapshot::empty());
        let mut service = RefreshService::new(ledger(), NullClock::new(1_700_000_000), writer, config());

        let report = service.run_cycle().await;
        assert_eq!(report.cycle, 1);
        let staking = report.staking.unwrap();
        assert_eq!(staking.received, 3);
        assert_eq!(staking.rejected, 1);
        assert!(report.supply_refreshed);
        assert_eq!(report.tokens.stats().unwrap().received, 1);
        assert_eq!(report.foundation_total_balance, 300);
        assert_eq!(report.orphaned_delegation_balance, 0);

        let snap = reader.load();
        assert_eq!(snap.staking_records().len(), 2);
        assert_eq!(snap.find_by_identity("acc://alice.acme").unwrap().balance, 500);
        assert_eq!(snap.tokens()[0].symbol, "WACME");
        assert_eq!(snap.supply().unwrap().issued().unwrap(), 1000);
        assert_eq!(snap.foundation_total_balance(), 300);
        assert_eq!(snap.updated_at().as_secs(), 1_700_000_000);
    }

    #[tokio::test]
    async fn failed_sections_keep_previous_data() {
        let client = ledger();
        let clock = NullClock::new(10);
        let (writer, reader) = snapshot_store(Snapshot::empty());
        let mut service = RefreshService::new(client.clone(), clock.clone(), writer, config());
        service.run_cycle().await;

        client.clear_entries(STAKING);
        client.clear_token_issuer(ISSUER);
        client.set_balance("acc://alice.acme/stake", "650");
        clock.advance(900);

        let report = service.run_cycle().await;
        assert!(report.staking.is_none());
        assert!(!report.supply_refreshed);

        let snap = reader.load();
        assert_eq!(snap.staking_records().len(), 2);
        assert_eq!(snap.find_by_identity("acc://alice.acme").unwrap().balance, 650);
        assert_eq!(snap.supply().unwrap().issued().unwrap(), 1000);
        assert_eq!(snap.updated_at().as_secs(), 910);
    }

    #[tokio::test]
    async fn new_entries_in_later_cycles_are_merged() {
        let client = ledger();
        let (writer, reader) = snapshot_store(Snapshot::empty());
        let mut service = RefreshService::new(client.clone(), NullClock::new(0), writer, config());
        service.run_cycle().await;

        client.push_entry(
            STAKING,
            json_entry(
                "h4",
                r#"{"identity":"acc://alice.acme","accounts":[
                    {"type":"coreValidator","stake":"acc://alice.acme/stake","rewards":"acc://alice.acme/rewards","acceptingDelegates":"yes"},
                    {"type":"pure","stake":"acc://alice.acme/extra","rewards":"acc://alice.acme/rewards"}]}"#,
            ),
        );
        client.set_balance("acc://alice.acme/extra", "5");
        service.run_cycle().await;

        let snap = reader.load();
        assert_eq!(snap.records_for_identity("acc://alice.acme").len(), 2);
        assert_eq!(snap.staking_records().len(), 3);
        assert_eq!(snap.total_staked(), 575);
    }

    #[tokio::test]
    async fn replayed_feed_keeps_stale_sub_account_balance() {
        let client = NullLedgerClient::new()
            .with_entries(
                STAKING,
                vec![
                    json_entry(
                        "h1",
                        r#"{"type":"stakingValidator","identity":"acc://x.acme","stake":"acc://x.acme/a","rewards":"acc://x.acme/rewards"}"#,
                    ),
                    json_entry(
                        "h2",
                        r#"{"identity":"acc://x.acme","accounts":[
                            {"type":"stakingValidator","stake":"acc://x.acme/a","rewards":"acc://x.acme/rewards"},
                            {"type":"pure","stake":"acc://x.acme/b","rewards":"acc://x.acme/rewards"}]}"#,
                    ),
                ],
            )
            .with_token_issuer(acme_issuer("1000"))
            .with_balance("acc://x.acme/a", "100")
            .with_balance("acc://x.acme/b", "200");
        let (writer, reader) = snapshot_store(Snapshot::empty());
        let config = RefreshConfig {
            token_data_account: None,
            ..config()
        };
        let mut service = RefreshService::new(client.clone(), NullClock::new(0), writer, config);

        service.run_cycle().await;
        assert_eq!(reader.load().find_by_stake_account("acc://x.acme/b").unwrap().balance, 200);

        client.clear_balance("acc://x.acme/b");
        let report = service.run_cycle().await;
        assert_eq!(report.balances.failed, 1);
        assert_eq!(report.tokens, TokenFeed::Disabled);

        let snap = reader.load();
        assert_eq!(snap.records_for_identity("acc://x.acme").len(), 2);
        assert_eq!(snap.find_by_stake_account("acc://x.acme/b").unwrap().balance, 200);
        assert_eq!(snap.total_staked(), 300);
    }

    #[tokio::test]
    async fn token_fetch_failure_is_distinct_from_disabled() {
        let client = ledger();
        client.clear_entries(TOKENS);
        let (writer, _reader) = snapshot_store(Snapshot::empty());
        let mut service = RefreshService::new(client, NullClock::new(0), writer, config());
        assert!(service.run_cycle().await.tokens.failed());
    }

    #[tokio::test]
    async fn unresolved_delegation_is_reported_as_orphaned() {
        let client = ledger();
        client.push_entry(
            STAKING,
            json_entry(
                "h5",
                r#"{"type":"delegated","identity":"acc://carol.acme","stake":"acc://carol.acme/stake","rewards":"acc://carol.acme/rewards","delegate":"acc://nobody.acme"}"#,
            ),
        );
        client.set_balance("acc://carol.acme/stake", "42");
        let (writer, _reader) = snapshot_store(Snapshot::empty());
        let mut service = RefreshService::new(client, NullClock::new(0), writer, config());
        assert_eq!(service.run_cycle().await.orphaned_delegation_balance, 42);
    }

    #[tokio::test]
    async fn loop_runs_until_shutdown() {
        let (writer, reader) = snapshot_store(Snapshot::empty());
        let service = RefreshService::new(ledger(), NullClock::new(0), writer, config());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (report_tx, mut report_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(service.run(NullTicker::limited(2), shutdown_rx, move |report| {
            let _ = report_tx.send(report.cycle);
        }));

        assert_eq!(report_rx.recv().await, Some(1));
        assert_eq!(report_rx.recv().await, Some(2));
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(report_rx.recv().await, None);
        assert_eq!(reader.load().staking_records().len(), 2);
    }

    #[tokio::test]
    async fn shutdown_before_first_tick_runs_nothing() {
        let (writer, reader) = snapshot_store(Snapshot::empty());
        let service = RefreshService::new(ledger(), NullClock::new(0), writer, config());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        let mut cycles = 0;
        service
            .run(NullTicker::new(), shutdown_rx, |_| cycles += 1)
            .await;
        assert_eq!(cycles, 0);
        assert!(reader.load().staking_records().is_empty());
    }
}
