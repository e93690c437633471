//! Repository port for claims.

use crate::claim::domain::{Claim, ClaimId, ClaimStatus, CompletionSubmission};
use crate::error::ErrorKind;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for claim repository operations.
pub type ClaimRepositoryResult<T> = Result<T, ClaimRepositoryError>;

/// Outcome of a capacity-conditional claim insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionRecord {
    /// The claim was inserted.
    Inserted {
        /// The stored claim.
        claim: Claim,
        /// Active claims on the task before the insert.
        prior_active: usize,
    },
    /// The claimer already holds an active claim on the task.
    Existing(Claim),
    /// The task's active claims already fill its capacity.
    AtCapacity {
        /// Active claims on the task.
        active: usize,
    },
}

/// Claim persistence contract.
#[async_trait]
pub trait ClaimRepository: Send + Sync {
    /// Inserts `claim` unless its claimer already holds an active claim on
    /// the task or the task already has `capacity` active claims.
    ///
    /// The lookup, count and insert happen as one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimRepositoryError::DuplicateClaim`] when the claim ID
    /// already exists.
    async fn create_within_capacity(
        &self,
        claim: &Claim,
        capacity: usize,
    ) -> ClaimRepositoryResult<AdmissionRecord>;

    /// Finds a claim by identifier.
    ///
    /// Returns `None` when the claim does not exist.
    async fn find_by_id(&self, id: ClaimId) -> ClaimRepositoryResult<Option<Claim>>;

    /// Returns all claims on a task in creation order.
    async fn find_by_task(&self, task_id: TaskId) -> ClaimRepositoryResult<Vec<Claim>>;

    /// Finds the claimer's active claim on a task.
    async fn find_active_by_task_and_claimer(
        &self,
        task_id: TaskId,
        claimer: UserId,
    ) -> ClaimRepositoryResult<Option<Claim>>;

    /// Counts the active claims on a task.
    async fn count_active_by_task(&self, task_id: TaskId) -> ClaimRepositoryResult<usize>;

    /// Moves the claim to `next` only while its stored status is `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimRepositoryError::NotFound`] for an unknown claim and
    /// [`ClaimRepositoryError::StatusConflict`] when the stored status
    /// differs or the move is not allowed.
    async fn update_status(
        &self,
        id: ClaimId,
        expected: ClaimStatus,
        next: ClaimStatus,
        at: DateTime<Utc>,
    ) -> ClaimRepositoryResult<Claim>;

    /// Attaches the submission to a pending claim.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimRepositoryError::NotFound`] for an unknown claim and
    /// [`ClaimRepositoryError::StatusConflict`] when the claim is no longer
    /// pending.
    async fn record_submission(
        &self,
        id: ClaimId,
        submission: CompletionSubmission,
        at: DateTime<Utc>,
    ) -> ClaimRepositoryResult<Claim>;
}

/// Errors returned by claim repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ClaimRepositoryError {
    /// A claim with the same identifier already exists.
    #[error("duplicate claim identifier: {0}")]
    DuplicateClaim(ClaimId),

    /// The claim was not found.
    #[error("claim not found: {0}")]
    NotFound(ClaimId),

    /// The stored status did not permit the update.
    #[error("claim {claim_id} status is {actual}, expected {expected}")]
    StatusConflict {
        /// Claim being updated.
        claim_id: ClaimId,
        /// Status the writer expected.
        expected: ClaimStatus,
        /// Status actually stored.
        actual: ClaimStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ClaimRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::StatusConflict { .. } => ErrorKind::StateConflict,
            Self::DuplicateClaim(_) | Self::Persistence(_) => ErrorKind::Internal,
        }
    }
}
