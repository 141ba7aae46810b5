//! Prometheus metrics for the mirror node.
//!
//! Counters and gauges are fed from refresh cycle reports. [`NodeMetrics`]
//! owns a dedicated [`Registry`] that the HTTP `/metrics` endpoint encodes
//! into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, HistogramOpts, IntCounter, IntGauge, Opts,
    Registry,
};

use acme_engine::CycleReport;

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Refresh cycles completed.
    pub cycles: IntCounter,
    /// Ledger entries rejected by the decoder.
    pub entries_rejected: IntCounter,
    /// Data-set or supply fetches that failed and kept previous data.
    pub section_failures: IntCounter,
    /// Stake account balance lookups that failed.
    pub balance_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Staking records in the published snapshot.
    pub staking_records: IntGauge,
    /// Tokens in the published snapshot.
    pub tokens: IntGauge,
    /// Summed foundation account balance, base units.
    pub foundation_balance: IntGauge,
    /// Balance of delegations no validator accepted, base units.
    pub orphaned_delegation_balance: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a refresh cycle, in seconds.
    pub cycle_duration_seconds: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        // Counters
        let cycles = register_int_counter_with_registry!(
            Opts::new("acme_refresh_cycles_total", "Refresh cycles completed"),
            registry
        )
        .expect("failed to register cycles counter");

        let entries_rejected = register_int_counter_with_registry!(
            Opts::new(
                "acme_entries_rejected_total",
                "Ledger entries rejected by the decoder"
            ),
            registry
        )
        .expect("failed to register entries_rejected counter");

        let section_failures = register_int_counter_with_registry!(
            Opts::new(
                "acme_section_failures_total",
                "Feed or supply fetches that failed and kept previous data"
            ),
            registry
        )
        .expect("failed to register section_failures counter");

        let balance_failures = register_int_counter_with_registry!(
            Opts::new(
                "acme_balance_failures_total",
                "Stake account balance lookups that failed"
            ),
            registry
        )
        .expect("failed to register balance_failures counter");

        // Gauges
        let staking_records = register_int_gauge_with_registry!(
            Opts::new("acme_staking_records", "Staking records in the snapshot"),
            registry
        )
        .expect("failed to register staking_records gauge");

        let tokens = register_int_gauge_with_registry!(
            Opts::new("acme_tokens", "Tokens in the snapshot"),
            registry
        )
        .expect("failed to register tokens gauge");

        let foundation_balance = register_int_gauge_with_registry!(
            Opts::new(
                "acme_foundation_balance",
                "Summed foundation account balance in base units"
            ),
            registry
        )
        .expect("failed to register foundation_balance gauge");

        let orphaned_delegation_balance = register_int_gauge_with_registry!(
            Opts::new(
                "acme_orphaned_delegation_balance",
                "Balance of delegations not attributed to any validator, base units"
            ),
            registry
        )
        .expect("failed to register orphaned_delegation_balance gauge");

        // Histogram – exponential buckets covering 0.1 s → ~27 min.
        let cycle_duration_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "acme_refresh_cycle_duration_seconds",
                "Refresh cycle wall time in seconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15).unwrap()),
            registry
        )
        .expect("failed to register cycle_duration_seconds histogram");

        Self {
            registry,
            cycles,
            entries_rejected,
            section_failures,
            balance_failures,
            staking_records,
            tokens,
            foundation_balance,
            orphaned_delegation_balance,
            cycle_duration_seconds,
        }
    }

    /// Fold one cycle report into the metrics.
    pub fn record_cycle(&self, report: &CycleReport) {
        self.cycles.inc();

        let rejected = report
            .staking
            .iter()
            .chain(report.tokens.stats())
            .map(|stats| stats.rejected as u64)
            .sum();
        self.entries_rejected.inc_by(rejected);

        let failed_sections = u64::from(report.staking.is_none())
            + u64::from(report.tokens.failed())
            + u64::from(!report.supply_refreshed);
        self.section_failures.inc_by(failed_sections);
        self.balance_failures.inc_by(report.balances.failed as u64);

        self.staking_records.set(report.records as i64);
        self.tokens.set(report.token_count as i64);
        self.foundation_balance.set(report.foundation_total_balance);
        self.orphaned_delegation_balance
            .set(report.orphaned_delegation_balance);
        self.cycle_duration_seconds
            .observe(report.elapsed.as_secs_f64());
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
