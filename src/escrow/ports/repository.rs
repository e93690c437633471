//! Repository port for the escrow ledger.

use crate::escrow::domain::{
    EscrowDomainError, EscrowTransaction, EscrowTransactionId, EscrowTransactionStatus,
};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for escrow repository operations.
pub type EscrowRepositoryResult<T> = Result<T, EscrowRepositoryError>;

/// Escrow ledger persistence contract.
///
/// The ledger is append-only: entries are never removed, and the only
/// mutation is the status change of a pending entry.
#[async_trait]
pub trait EscrowRepository: Send + Sync {
    /// Appends a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowRepositoryError::DuplicateTransaction`] when the entry
    /// identifier already exists.
    async fn append(&self, transaction: &EscrowTransaction) -> EscrowRepositoryResult<()>;

    /// Returns all entries for a task in append order.
    async fn find_by_task(&self, task_id: TaskId)
    -> EscrowRepositoryResult<Vec<EscrowTransaction>>;

    /// Moves a pending entry to `next`, stamping completion time when `next`
    /// is [`EscrowTransactionStatus::Completed`].
    ///
    /// # Errors
    ///
    /// Returns [`EscrowRepositoryError::NotFound`] for an unknown entry and
    /// [`EscrowRepositoryError::InvalidTransition`] when the entry is no
    /// longer pending.
    async fn update_status(
        &self,
        id: EscrowTransactionId,
        next: EscrowTransactionStatus,
        at: DateTime<Utc>,
    ) -> EscrowRepositoryResult<EscrowTransaction>;
}

/// Errors returned by escrow repository implementations.
#[derive(Debug, Clone, Error)]
pub enum EscrowRepositoryError {
    /// An entry with the same identifier already exists.
    #[error("duplicate escrow transaction: {0}")]
    DuplicateTransaction(EscrowTransactionId),

    /// The entry was not found.
    #[error("escrow transaction not found: {0}")]
    NotFound(EscrowTransactionId),

    /// The requested status change is not allowed.
    #[error(transparent)]
    InvalidTransition(#[from] EscrowDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EscrowRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
