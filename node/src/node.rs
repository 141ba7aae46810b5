//! The mirror node: one refresh task writing snapshots, one HTTP server
//! reading them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use acme_client::LedgerClient;
use acme_engine::{IntervalTicker, RefreshService};
use acme_rpc::{RpcServer, RpcState};
use acme_store::{snapshot_store, Snapshot, SnapshotReader, SnapshotWriter};
use acme_types::SystemClock;

use crate::config::NodeConfig;
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// Timeout for waiting on background tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MirrorNode<C> {
    pub config: NodeConfig,
    pub shutdown: Arc<ShutdownController>,
    pub metrics: Option<Arc<NodeMetrics>>,
    reader: SnapshotReader,
    /// Taken by the refresh task when the node starts.
    pending: Option<(C, SnapshotWriter)>,
    task_handles: Vec<JoinHandle<()>>,
}

impl<C: LedgerClient + 'static> MirrorNode<C> {
    /// Validate the configuration and set up the snapshot store. Nothing
    /// runs until [`spawn_tasks`](Self::spawn_tasks) or
    /// [`start`](Self::start).
    pub fn new(config: NodeConfig, client: C) -> Result<Self, NodeError> {
        config.validate()?;
        let (writer, reader) = snapshot_store(Snapshot::empty());
        let metrics = config.enable_metrics.then(|| Arc::new(NodeMetrics::new()));
        Ok(Self {
            config,
            shutdown: Arc::new(ShutdownController::new()),
            metrics,
            reader,
            pending: Some((client, writer)),
            task_handles: Vec::new(),
        })
    }

    /// A read handle on the published snapshot.
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// Spawn the refresh loop and the HTTP server.
    pub fn spawn_tasks(&mut self) -> Result<(), NodeError> {
        let (client, writer) = self.pending.take().ok_or(NodeError::AlreadyStarted)?;

        tracing::info!(
            rpc_port = self.config.rpc_port,
            refresh_interval_secs = self.config.refresh_interval_secs,
            staking = %self.config.staking_data_account,
            metrics = self.config.enable_metrics,
            "mirror node starting"
        );

        // Refresh loop
        let service = RefreshService::new(client, SystemClock, writer, self.config.refresh_config());
        let ticker = IntervalTicker::new(self.config.refresh_interval());
        let shutdown_rx_refresh = self.shutdown.subscribe();
        let metrics_refresh = self.metrics.clone();
        let refresh_handle = tokio::spawn(service.run(ticker, shutdown_rx_refresh, move |report| {
            if let Some(metrics) = &metrics_refresh {
                metrics.record_cycle(report);
            }
        }));
        self.task_handles.push(refresh_handle);

        // HTTP server
        let mut rpc_state = RpcState::new(self.reader.clone());
        if let Some(metrics) = &self.metrics {
            rpc_state = rpc_state.with_registry(metrics.registry.clone());
        }
        let rpc_server = RpcServer::new(self.config.rpc_port, rpc_state);
        let shutdown_rx_rpc = self.shutdown.subscribe();
        let shutdown_rpc = Arc::clone(&self.shutdown);
        let rpc_handle = tokio::spawn(async move {
            if let Err(e) = rpc_server.start(shutdown_rx_rpc).await {
                tracing::error!(error = %e, "HTTP server failed");
                shutdown_rpc.shutdown();
            }
        });
        self.task_handles.push(rpc_handle);

        Ok(())
    }

    /// Spawn all tasks, then wait for the shutdown signal.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        self.spawn_tasks()?;
        self.shutdown.wait_for_signal().await;
        Ok(())
    }

    /// Signal every task and wait for them to finish. A refresh cycle in
    /// progress completes before the refresh task exits.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("mirror node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        tracing::info!("mirror node stopped");
        Ok(())
    }
}
