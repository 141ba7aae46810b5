//! Ledger mirror node. Wires the refresh engine to the query server.
//!
//! The node is the coordinator that:
//! - Loads and validates configuration
//! - Owns the snapshot store and hands the only writer to the refresh task
//! - Runs the refresh loop on a fixed interval
//! - Serves the HTTP query surface from snapshot readers
//! - Feeds cycle reports into Prometheus metrics
//! - Shuts every task down on SIGINT/SIGTERM

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::MirrorNode;
pub use shutdown::ShutdownController;
