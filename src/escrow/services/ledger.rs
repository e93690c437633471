//! Custody operations over the escrow ledger.

use std::sync::Arc;

use mockable::Clock;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ErrorKind;
use crate::escrow::{
    domain::{EscrowTransaction, EscrowTransactionStatus, EscrowTransactionType},
    ports::{EscrowRepository, EscrowRepositoryError},
};
use crate::task::{
    domain::{Task, TaskId},
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::user::domain::UserId;

/// Service-level errors for escrow custody operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The task's reward is already in custody.
    #[error("escrow for task {0} is already locked")]
    AlreadyLocked(TaskId),

    /// The task's reward is not in custody.
    #[error("escrow for task {0} is not locked")]
    NotLocked(TaskId),

    /// Custody for the task has already been released to another user.
    #[error("escrow for task {task_id} was already released to {recipient}")]
    AlreadyReleased {
        /// Task whose custody was released.
        task_id: TaskId,
        /// User who received the earlier release.
        recipient: UserId,
    },

    /// The amount to move is not positive.
    #[error("escrow amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Ledger persistence failed.
    #[error(transparent)]
    Ledger(#[from] EscrowRepositoryError),

    /// Task persistence failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),
}

impl LedgerError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyLocked(_) | Self::NotLocked(_) | Self::AlreadyReleased { .. } => {
                ErrorKind::StateConflict
            }
            Self::InvalidAmount(_) => ErrorKind::Validation,
            Self::Ledger(_) => ErrorKind::Internal,
            Self::Task(err) => err.kind(),
        }
    }
}

/// Result type for ledger service operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Escrow custody service.
///
/// Each custody change is recorded as a pending ledger entry, applied, and
/// then marked completed. An entry whose custody change fails is marked
/// failed and the custody flag is left as it was.
pub struct LedgerService<E, T, C>
where
    E: EscrowRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    ledger: Arc<E>,
    tasks: Arc<T>,
    clock: Arc<C>,
}

impl<E, T, C> Clone for LedgerService<E, T, C>
where
    E: EscrowRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            tasks: Arc::clone(&self.tasks),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<E, T, C> LedgerService<E, T, C>
where
    E: EscrowRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a ledger service over the given repositories and clock.
    #[must_use]
    pub const fn new(ledger: Arc<E>, tasks: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            ledger,
            tasks,
            clock,
        }
    }

    /// Takes the task's reward into custody on behalf of `owner`.
    ///
    /// Returns the task with its custody flag set.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyLocked`] when custody is already held,
    /// [`LedgerError::TaskNotFound`] for an unknown task, or a persistence
    /// error when the ledger or flag update fails.
    pub async fn lock_escrow(
        &self,
        task_id: TaskId,
        owner: UserId,
        amount: Decimal,
    ) -> LedgerResult<Task> {
        ensure_positive(amount)?;
        let task = self.load_task(task_id).await?;
        if task.escrow_locked() {
            return Err(LedgerError::AlreadyLocked(task_id));
        }

        let entry = self
            .open_entry(task_id, owner, amount, EscrowTransactionType::Lock)
            .await?;
        let locked = match self
            .tasks
            .set_escrow_locked(task_id, true, self.clock.utc())
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                self.mark_failed(&entry).await;
                return Err(err.into());
            }
        };
        self.close_entry(&entry).await?;
        info!(%task_id, %owner, %amount, "escrow locked");
        Ok(locked)
    }

    /// Pays the task's custody out to `recipient`.
    ///
    /// Releasing again to the same recipient returns the earlier entry
    /// without recording a new one. The custody flag is not cleared.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyReleased`] when custody went to another
    /// user, [`LedgerError::NotLocked`] when no custody is held, or a
    /// persistence error.
    pub async fn release_escrow(
        &self,
        task_id: TaskId,
        recipient: UserId,
        amount: Decimal,
    ) -> LedgerResult<EscrowTransaction> {
        ensure_positive(amount)?;
        let task = self.load_task(task_id).await?;
        if let Some(existing) = self
            .completed_entry(task_id, EscrowTransactionType::Release)
            .await?
        {
            if existing.user_id() == recipient {
                debug!(%task_id, %recipient, "escrow release already recorded");
                return Ok(existing);
            }
            return Err(LedgerError::AlreadyReleased {
                task_id,
                recipient: existing.user_id(),
            });
        }
        if !task.escrow_locked() {
            return Err(LedgerError::NotLocked(task_id));
        }

        let entry = self
            .open_entry(task_id, recipient, amount, EscrowTransactionType::Release)
            .await?;
        let released = self.close_entry(&entry).await?;
        info!(%task_id, %recipient, %amount, "escrow released");
        Ok(released)
    }

    /// Returns the task's custody to `owner` and clears the custody flag.
    ///
    /// A task that was already refunded returns the earlier entry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotLocked`] when no custody is held, or a
    /// persistence error when the ledger or flag update fails.
    pub async fn refund_escrow(
        &self,
        task_id: TaskId,
        owner: UserId,
        amount: Decimal,
    ) -> LedgerResult<EscrowTransaction> {
        ensure_positive(amount)?;
        if let Some(existing) = self
            .completed_entry(task_id, EscrowTransactionType::Refund)
            .await?
        {
            debug!(%task_id, "escrow refund already recorded");
            return Ok(existing);
        }
        let task = self.load_task(task_id).await?;
        if !task.escrow_locked() {
            return Err(LedgerError::NotLocked(task_id));
        }

        let entry = self
            .open_entry(task_id, owner, amount, EscrowTransactionType::Refund)
            .await?;
        if let Err(err) = self
            .tasks
            .set_escrow_locked(task_id, false, self.clock.utc())
            .await
        {
            self.mark_failed(&entry).await;
            return Err(err.into());
        }
        let refunded = self.close_entry(&entry).await?;
        info!(%task_id, %owner, %amount, "escrow refunded");
        Ok(refunded)
    }

    /// Returns every ledger entry for a task in the order recorded.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Ledger`] when the ledger cannot be read.
    pub async fn transactions_for_task(
        &self,
        task_id: TaskId,
    ) -> LedgerResult<Vec<EscrowTransaction>> {
        Ok(self.ledger.find_by_task(task_id).await?)
    }

    async fn load_task(&self, task_id: TaskId) -> LedgerResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(LedgerError::TaskNotFound(task_id))
    }

    async fn completed_entry(
        &self,
        task_id: TaskId,
        transaction_type: EscrowTransactionType,
    ) -> LedgerResult<Option<EscrowTransaction>> {
        let entries = self.ledger.find_by_task(task_id).await?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.is_completed(transaction_type)))
    }

    async fn open_entry(
        &self,
        task_id: TaskId,
        user_id: UserId,
        amount: Decimal,
        transaction_type: EscrowTransactionType,
    ) -> LedgerResult<EscrowTransaction> {
        let entry = EscrowTransaction::new_pending(
            task_id,
            user_id,
            amount,
            transaction_type,
            &*self.clock,
        );
        self.ledger.append(&entry).await?;
        Ok(entry)
    }

    async fn close_entry(&self, entry: &EscrowTransaction) -> LedgerResult<EscrowTransaction> {
        Ok(self
            .ledger
            .update_status(
                entry.id(),
                EscrowTransactionStatus::Completed,
                self.clock.utc(),
            )
            .await?)
    }

    async fn mark_failed(&self, entry: &EscrowTransaction) {
        if let Err(err) = self
            .ledger
            .update_status(entry.id(), EscrowTransactionStatus::Failed, self.clock.utc())
            .await
        {
            warn!(
                transaction_id = %entry.id(),
                error = %err,
                "failed to mark escrow transaction as failed"
            );
        }
    }
}

fn ensure_positive(amount: Decimal) -> LedgerResult<()> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}
