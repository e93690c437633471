//! One reconciliation pass.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::claim::ports::{ClaimRepository, ClaimRepositoryError};
use crate::config::{OwnerDeadlinePolicy, ReconcilerConfig};
use crate::error::ErrorKind;
use crate::escrow::{ports::EscrowRepository, services::LedgerError};
use crate::keyed_lock::KeyedLocks;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::TaskRepository,
    services::{TaskLifecycleError, TaskLifecycleService},
};

/// Errors that abort a whole reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Listing the candidate tasks failed.
    #[error("failed to list reconciliation candidates: {0}")]
    Listing(#[from] TaskLifecycleError),
}

impl ReconcileError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Listing(err) => err.kind(),
        }
    }
}

/// Result type for reconciliation passes.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Counts of what a single pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Candidate tasks considered across both phases.
    pub examined: usize,
    /// Tasks moved to `Cancelled`.
    pub cancelled: usize,
    /// Escrow refunds recorded before cancelling.
    pub refunded: usize,
    /// Tasks moved to `Disputed`.
    pub disputed: usize,
    /// Candidates left unchanged.
    pub skipped: usize,
    /// Candidates whose handling failed and will be retried next pass.
    pub failed: usize,
}

#[derive(Debug, Error)]
enum SweepError {
    #[error("timed out waiting for the task lock")]
    LockTimeout,
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),
    #[error(transparent)]
    Claims(#[from] ClaimRepositoryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepOutcome {
    Cancelled { refunded: bool },
    Disputed,
    Skipped,
}

/// Periodic sweep over tasks whose deadlines have passed.
///
/// Every change is made under the same per-task lock that claim admission
/// and settlement take, so a sweep never races a claim on the same task.
pub struct Reconciler<T, E, R, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    C: Clock + Send + Sync,
{
    lifecycle: TaskLifecycleService<T, E, C>,
    claims: Arc<R>,
    clock: Arc<C>,
    task_locks: KeyedLocks<TaskId>,
    config: ReconcilerConfig,
}

impl<T, E, R, C> Clone for Reconciler<T, E, R, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            claims: Arc::clone(&self.claims),
            clock: Arc::clone(&self.clock),
            task_locks: self.task_locks.clone(),
            config: self.config,
        }
    }
}

impl<T, E, R, C> Reconciler<T, E, R, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    C: Clock + Send + Sync,
{
    /// Creates a reconciler with the default schedule and policy.
    ///
    /// `task_locks` must be shared with the claim service.
    #[must_use]
    pub fn new(
        lifecycle: TaskLifecycleService<T, E, C>,
        claims: Arc<R>,
        clock: Arc<C>,
        task_locks: KeyedLocks<TaskId>,
    ) -> Self {
        Self {
            lifecycle,
            claims,
            clock,
            task_locks,
            config: ReconcilerConfig::default(),
        }
    }

    /// Applies the reconciler section of the engine configuration.
    #[must_use]
    pub const fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active reconciler settings.
    #[must_use]
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Runs one sweep at the clock's current instant.
    ///
    /// Failures on individual tasks are logged and counted in
    /// [`ReconciliationReport::failed`]; the pass carries on with the next
    /// task.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Listing`] when a candidate query fails.
    pub async fn run_pass(&self) -> ReconcileResult<ReconciliationReport> {
        let mut report = ReconciliationReport::default();

        let expired = self.lifecycle.tasks_past_claim_deadline().await?;
        for task in &expired {
            report.examined += 1;
            let outcome = self.expire_unclaimed(task.id()).await;
            record(&mut report, task.id(), outcome);
        }

        if self.config.owner_deadline_policy == OwnerDeadlinePolicy::Dispute {
            let overdue = self.lifecycle.tasks_past_owner_deadline().await?;
            for task in overdue
                .iter()
                .filter(|task| task.status() == TaskStatus::Claimed)
            {
                report.examined += 1;
                let outcome = self.dispute_overdue(task.id()).await;
                record(&mut report, task.id(), outcome);
            }
        }

        info!(
            examined = report.examined,
            cancelled = report.cancelled,
            refunded = report.refunded,
            disputed = report.disputed,
            skipped = report.skipped,
            failed = report.failed,
            "reconciliation pass finished"
        );
        Ok(report)
    }

    async fn expire_unclaimed(&self, task_id: TaskId) -> Result<SweepOutcome, SweepError> {
        let _guard = self
            .task_locks
            .acquire_within(task_id, self.config.task_timeout())
            .await
            .ok_or(SweepError::LockTimeout)?;

        let task = self.lifecycle.get_task(task_id).await?;
        if !task.should_auto_cancel(self.clock.utc()) {
            debug!(%task_id, status = %task.status(), "task no longer eligible for cancellation");
            return Ok(SweepOutcome::Skipped);
        }
        let active = self.claims.count_active_by_task(task_id).await?;
        if active > 0 {
            info!(%task_id, active, "open task past claim deadline still has claims");
            return Ok(SweepOutcome::Skipped);
        }

        let refunded = self.refund_if_locked(&task).await?;
        self.lifecycle
            .transition_status(task_id, TaskStatus::Cancelled)
            .await?;
        Ok(SweepOutcome::Cancelled { refunded })
    }

    async fn refund_if_locked(&self, task: &Task) -> Result<bool, SweepError> {
        if !task.escrow_locked() {
            return Ok(false);
        }
        self.lifecycle
            .ledger()
            .refund_escrow(task.id(), task.owner_id(), task.reward().value())
            .await?;
        Ok(true)
    }

    async fn dispute_overdue(&self, task_id: TaskId) -> Result<SweepOutcome, SweepError> {
        let _guard = self
            .task_locks
            .acquire_within(task_id, self.config.task_timeout())
            .await
            .ok_or(SweepError::LockTimeout)?;

        let task = self.lifecycle.get_task(task_id).await?;
        if task.status() != TaskStatus::Claimed || !task.is_past_owner_deadline(self.clock.utc())
        {
            debug!(%task_id, status = %task.status(), "task no longer eligible for dispute");
            return Ok(SweepOutcome::Skipped);
        }
        self.lifecycle
            .transition_status(task_id, TaskStatus::Disputed)
            .await?;
        Ok(SweepOutcome::Disputed)
    }
}

fn record(
    report: &mut ReconciliationReport,
    task_id: TaskId,
    outcome: Result<SweepOutcome, SweepError>,
) {
    match outcome {
        Ok(SweepOutcome::Cancelled { refunded }) => {
            report.cancelled += 1;
            if refunded {
                report.refunded += 1;
            }
            info!(%task_id, refunded, "expired task cancelled");
        }
        Ok(SweepOutcome::Disputed) => {
            report.disputed += 1;
            info!(%task_id, "overdue task disputed");
        }
        Ok(SweepOutcome::Skipped) => report.skipped += 1,
        Err(err) => {
            report.failed += 1;
            warn!(%task_id, error = %err, "failed to reconcile task");
        }
    }
}
