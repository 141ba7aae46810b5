//! Node configuration with TOML file support.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use acme_engine::RefreshConfig;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a ledger mirror node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// HTTP query server port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// JSON-RPC endpoint of the ledger API.
    #[serde(default = "default_ledger_api_url")]
    pub ledger_api_url: String,

    /// Per-request timeout for ledger calls.
    #[serde(default = "default_client_timeout_secs")]
    pub client_timeout_secs: u64,

    /// Seconds between refresh cycles.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Data account holding staking registrations.
    #[serde(default = "default_staking_data_account")]
    pub staking_data_account: String,

    /// Data account holding the token registry. Empty disables tokens.
    #[serde(default = "default_token_data_account")]
    pub token_data_account: String,

    /// Issuer of the token whose supply is reported.
    #[serde(default = "default_supply_token_issuer")]
    pub supply_token_issuer: String,

    /// Accounts excluded from circulating supply.
    #[serde(default = "default_foundation_accounts")]
    pub foundation_accounts: Vec<String>,

    /// Entries requested per data-set page.
    #[serde(default = "default_entry_page_size")]
    pub entry_page_size: u64,

    /// Whether to expose Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_port() -> u16 {
    8082
}

fn default_ledger_api_url() -> String {
    "https://mainnet.accumulatenetwork.io/v2".to_string()
}

fn default_client_timeout_secs() -> u64 {
    5
}

fn default_refresh_interval_secs() -> u64 {
    900
}

fn default_staking_data_account() -> String {
    "acc://staking.acme/registered".to_string()
}

fn default_token_data_account() -> String {
    "acc://staking.acme/tokens".to_string()
}

fn default_supply_token_issuer() -> String {
    "acc://ACME".to_string()
}

fn default_foundation_accounts() -> Vec<String> {
    [
        "dev-block",
        "factom-block",
        "business/grants",
        "core-dev/grants",
        "ecosystem/grants",
        "governance/grants",
        "grant-block",
        "stake",
    ]
    .iter()
    .map(|path| format!("acc://accumulate.acme/{path}"))
    .collect()
}

fn default_entry_page_size() -> u64 {
    10_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject values the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.ledger_api_url.trim().is_empty() {
            return Err(NodeError::Config("ledger_api_url must not be empty".into()));
        }
        if self.staking_data_account.trim().is_empty() {
            return Err(NodeError::Config("staking_data_account must not be empty".into()));
        }
        if self.supply_token_issuer.trim().is_empty() {
            return Err(NodeError::Config("supply_token_issuer must not be empty".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(NodeError::Config("refresh_interval_secs must be positive".into()));
        }
        if self.entry_page_size == 0 {
            return Err(NodeError::Config("entry_page_size must be positive".into()));
        }
        if LogFormat::parse(&self.log_format).is_none() {
            return Err(NodeError::Config(format!(
                "unknown log_format {:?} (expected \"human\" or \"json\")",
                self.log_format
            )));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    /// The ledger locations each refresh cycle reads.
    pub fn refresh_config(&self) -> RefreshConfig {
        let token_data_account = Some(self.token_data_account.trim())
            .filter(|account| !account.is_empty())
            .map(str::to_string);
        RefreshConfig {
            staking_data_account: self.staking_data_account.clone(),
            token_data_account,
            supply_token_issuer: self.supply_token_issuer.clone(),
            foundation_accounts: self.foundation_accounts.clone(),
            page_size: self.entry_page_size,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_port: default_rpc_port(),
            ledger_api_url: default_ledger_api_url(),
            client_timeout_secs: default_client_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            staking_data_account: default_staking_data_account(),
            token_data_account: default_token_data_account(),
            supply_token_issuer: default_supply_token_issuer(),
            foundation_accounts: default_foundation_accounts(),
            entry_page_size: default_entry_page_size(),
            enable_metrics: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
