//! Interval driver for reconciliation passes.

use std::time::Duration;

use mockable::Clock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Reconciler;
use crate::claim::ports::ClaimRepository;
use crate::escrow::ports::EscrowRepository;
use crate::task::ports::TaskRepository;

/// Spawns a task that runs a pass every `interval` until `cancel` fires.
///
/// The first pass runs immediately. Ticks missed while a pass is still
/// running are skipped rather than replayed. A pass that fails is logged
/// and retried on the next tick.
pub fn spawn_reconciler<T, E, R, C>(
    reconciler: Reconciler<T, E, R, C>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    T: TaskRepository + 'static,
    E: EscrowRepository + 'static,
    R: ClaimRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = interval.as_secs(), "reconciler started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = reconciler.run_pass().await {
                        warn!(error = %err, "reconciliation pass failed");
                    }
                }
            }
        }

        info!("reconciler stopped");
    })
}
