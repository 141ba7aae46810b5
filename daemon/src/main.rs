//! Ledger mirror daemon.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use acme_client::AccumulateClient;
use acme_node::{init_logging, LogFormat, MirrorNode, NodeConfig};

#[derive(Parser)]
#[command(name = "acme-daemon", about = "Staking, token and supply mirror for the Accumulate ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ACME_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP query server port.
    #[arg(long, env = "ACME_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Ledger JSON-RPC endpoint.
    #[arg(long, env = "ACME_LEDGER_API_URL")]
    ledger_api_url: Option<String>,

    /// Seconds between refresh cycles.
    #[arg(long, env = "ACME_REFRESH_INTERVAL_SECS")]
    refresh_interval_secs: Option<u64>,

    /// Per-request ledger timeout in seconds.
    #[arg(long, env = "ACME_CLIENT_TIMEOUT_SECS")]
    client_timeout_secs: Option<u64>,

    /// Data account holding staking registrations.
    #[arg(long, env = "ACME_STAKING_DATA_ACCOUNT")]
    staking_data_account: Option<String>,

    /// Data account holding the token registry; pass "" to disable tokens.
    #[arg(long, env = "ACME_TOKEN_DATA_ACCOUNT")]
    token_data_account: Option<String>,

    /// Issuer of the token whose supply is reported.
    #[arg(long, env = "ACME_SUPPLY_TOKEN_ISSUER")]
    supply_token_issuer: Option<String>,

    /// Foundation accounts (comma-separated), replacing the configured list.
    #[arg(long, env = "ACME_FOUNDATION_ACCOUNTS", value_delimiter = ',')]
    foundation_accounts: Vec<String>,

    /// Entries requested per data-set page.
    #[arg(long, env = "ACME_ENTRY_PAGE_SIZE")]
    entry_page_size: Option<u64>,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "ACME_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "ACME_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ACME_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Layer flags and env vars over the file (or default) configuration.
    fn into_config(self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config file {}", path.display()))?,
            None => NodeConfig::default(),
        };

        Ok(NodeConfig {
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            ledger_api_url: self.ledger_api_url.unwrap_or(base.ledger_api_url),
            client_timeout_secs: self.client_timeout_secs.unwrap_or(base.client_timeout_secs),
            refresh_interval_secs: self
                .refresh_interval_secs
                .unwrap_or(base.refresh_interval_secs),
            staking_data_account: self
                .staking_data_account
                .unwrap_or(base.staking_data_account),
            token_data_account: self.token_data_account.unwrap_or(base.token_data_account),
            supply_token_issuer: self.supply_token_issuer.unwrap_or(base.supply_token_issuer),
            foundation_accounts: if self.foundation_accounts.is_empty() {
                base.foundation_accounts
            } else {
                self.foundation_accounts
            },
            entry_page_size: self.entry_page_size.unwrap_or(base.entry_page_size),
            enable_metrics: self.metrics || base.enable_metrics,
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();
    let config = cli.into_config()?;
    config.validate()?;

    let format = LogFormat::parse(&config.log_format).unwrap_or(LogFormat::Human);
    init_logging(format, &config.log_level);
    if let Some(path) = config_path {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    tracing::info!(
        ledger = %config.ledger_api_url,
        rpc_port = config.rpc_port,
        refresh_interval_secs = config.refresh_interval_secs,
        "starting ledger mirror"
    );

    let client = AccumulateClient::new(&config.ledger_api_url, config.client_timeout());
    let mut node = MirrorNode::new(config, client)?;
    node.start().await?;

    tracing::info!("shutdown signal received, stopping node");
    node.stop().await?;

    tracing::info!("ledger mirror exited cleanly");
    Ok(())
}
