//! Hosts the task broker and its reconciler in one process.
//!
//! Usage:
//!
//! ```text
//! taskvault-daemon [config-path]
//! ```
//!
//! The optional `config-path` names a JSON [`EngineConfig`] document; without
//! it the built-in defaults apply. A representative document is:
//!
//! ```json
//! {
//!   "max_title_chars": 500,
//!   "page_limits": { "default_limit": 20, "max_limit": 100 },
//!   "reputation_per_approval": 1,
//!   "reconciler": {
//!     "interval_secs": 60,
//!     "task_timeout_ms": 5000,
//!     "owner_deadline_policy": "dispute"
//!   }
//! }
//! ```
//!
//! The daemon runs a reconciliation pass on every interval tick and exits on
//! Ctrl-C once the current pass has finished.

use std::env;
use std::path::PathBuf;

use taskvault::broker::InMemoryTaskBroker;
use taskvault::config::{ConfigError, EngineConfig};
use taskvault::reconcile::spawn_reconciler;
use taskvault::telemetry::init_tracing;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum DaemonError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
    #[error("reconciler task failed: {0}")]
    Reconciler(#[source] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let installed = init_tracing("info,taskvault=info");
    debug!(installed, "tracing initialized");

    if let Err(err) = run().await {
        error!(error = %err, "taskvault daemon failed");
        return Err(err.into());
    }
    Ok(())
}

async fn run() -> Result<(), DaemonError> {
    let config = load_config(env::args().skip(1))?;
    let broker = InMemoryTaskBroker::in_memory(&config);
    let cancel = CancellationToken::new();
    let interval = config.reconciler.interval();
    info!(
        interval_secs = config.reconciler.interval_secs,
        owner_deadline_policy = ?config.reconciler.owner_deadline_policy,
        "taskvault daemon starting"
    );

    let reconciler = spawn_reconciler(broker.reconciler().clone(), interval, cancel.clone());

    tokio::signal::ctrl_c().await.map_err(DaemonError::Signal)?;
    info!("shutdown requested");
    cancel.cancel();
    reconciler.await.map_err(DaemonError::Reconciler)?;
    info!("taskvault daemon stopped");
    Ok(())
}

fn load_config(mut args: impl Iterator<Item = String>) -> Result<EngineConfig, DaemonError> {
    let path = args.next().map(PathBuf::from);
    if args.next().is_some() {
        return Err(DaemonError::InvalidArgs("expected at most one config path"));
    }
    path.map_or_else(
        || Ok(EngineConfig::default()),
        |config_path| {
            info!(path = %config_path.display(), "loading configuration");
            Ok(EngineConfig::from_json_file(&config_path)?)
        },
    )
}
