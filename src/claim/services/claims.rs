//! Claim service state, errors and read operations.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;

use crate::claim::{
    domain::{Claim, ClaimDomainError, ClaimId, ClaimStatus},
    ports::{ChatChannelPort, ClaimRepository, ClaimRepositoryError},
};
use crate::config::EngineConfig;
use crate::error::ErrorKind;
use crate::escrow::{ports::EscrowRepository, services::LedgerError};
use crate::keyed_lock::KeyedLocks;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::TaskRepository,
    services::{TaskLifecycleError, TaskLifecycleService},
};
use crate::user::{domain::UserId, ports::UserAccountRepository, ports::UserRepositoryError};

/// Result of a claim request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A new pending claim was admitted.
    Created(Claim),
    /// The claimer already held an active claim, which is returned unchanged.
    AlreadyClaimed(Claim),
}

impl ClaimOutcome {
    /// Returns the claim regardless of whether it was just created.
    #[must_use]
    pub const fn claim(&self) -> &Claim {
        match self {
            Self::Created(claim) | Self::AlreadyClaimed(claim) => claim,
        }
    }

    /// Returns `true` when the claim was admitted by this request.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Service-level errors for claim operations.
#[derive(Debug, Error)]
pub enum ClaimServiceError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The claim does not exist.
    #[error("claim not found: {0}")]
    ClaimNotFound(ClaimId),

    /// The task is not accepting claims.
    #[error("task {task_id} is not claimable (status {status})")]
    TaskNotClaimable {
        /// Requested task.
        task_id: TaskId,
        /// Task status at the time of the request.
        status: TaskStatus,
    },

    /// The task's active claims fill its capacity.
    #[error("task {task_id} already has {max_claimants} active claims")]
    ClaimLimitReached {
        /// Requested task.
        task_id: TaskId,
        /// The task's claimant limit.
        max_claimants: u32,
    },

    /// The caller may not act on this claim.
    #[error("user {user_id} may not act on claim {claim_id}")]
    Unauthorized {
        /// Claim acted on.
        claim_id: ClaimId,
        /// Calling user.
        user_id: UserId,
    },

    /// The claim has no completion submission yet.
    #[error("claim {0} has not been submitted")]
    NotSubmitted(ClaimId),

    /// The claim was already resolved.
    #[error("claim {claim_id} is already {status}")]
    AlreadyResolved {
        /// Claim acted on.
        claim_id: ClaimId,
        /// Current claim status.
        status: ClaimStatus,
    },

    /// The task is not in a status that allows settlement.
    #[error("task {task_id} cannot be settled while {status}")]
    TaskNotSettleable {
        /// Task of the claim.
        task_id: TaskId,
        /// Current task status.
        status: TaskStatus,
    },

    /// Another claim on the task was already approved or paid.
    #[error("task {0} is already being settled for another claim")]
    SettlementInProgress(TaskId),

    /// Claim validation failed.
    #[error(transparent)]
    Domain(#[from] ClaimDomainError),

    /// Claim persistence failed.
    #[error(transparent)]
    Repository(#[from] ClaimRepositoryError),

    /// A task lifecycle step failed.
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),

    /// An escrow step failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A user account update failed.
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
}

impl ClaimServiceError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_) | Self::ClaimNotFound(_) => ErrorKind::NotFound,
            Self::TaskNotClaimable { .. }
            | Self::ClaimLimitReached { .. }
            | Self::NotSubmitted(_)
            | Self::AlreadyResolved { .. }
            | Self::TaskNotSettleable { .. }
            | Self::SettlementInProgress(_) => ErrorKind::StateConflict,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Domain(err) => err.kind(),
            Self::Repository(err) => err.kind(),
            Self::Lifecycle(err) => err.kind(),
            Self::Ledger(err) => err.kind(),
            Self::Users(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for claim service operations.
pub type ClaimServiceResult<T> = Result<T, ClaimServiceError>;

/// Claim admission and settlement service.
///
/// Admission and settlement for one task are serialized through the shared
/// per-task locks; operations on different tasks run in parallel.
pub struct ClaimService<T, E, R, U, H, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    U: UserAccountRepository,
    H: ChatChannelPort,
    C: Clock + Send + Sync,
{
    pub(super) lifecycle: TaskLifecycleService<T, E, C>,
    pub(super) claims: Arc<R>,
    pub(super) users: Arc<U>,
    pub(super) chat: Arc<H>,
    pub(super) clock: Arc<C>,
    pub(super) task_locks: KeyedLocks<TaskId>,
    pub(super) reputation_per_approval: i64,
}

impl<T, E, R, U, H, C> Clone for ClaimService<T, E, R, U, H, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    U: UserAccountRepository,
    H: ChatChannelPort,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            claims: Arc::clone(&self.claims),
            users: Arc::clone(&self.users),
            chat: Arc::clone(&self.chat),
            clock: Arc::clone(&self.clock),
            task_locks: self.task_locks.clone(),
            reputation_per_approval: self.reputation_per_approval,
        }
    }
}

impl<T, E, R, U, H, C> ClaimService<T, E, R, U, H, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    U: UserAccountRepository,
    H: ChatChannelPort,
    C: Clock + Send + Sync,
{
    /// Creates a claim service.
    ///
    /// `task_locks` must be shared with every other writer of the same tasks.
    #[must_use]
    pub fn new(
        lifecycle: TaskLifecycleService<T, E, C>,
        claims: Arc<R>,
        users: Arc<U>,
        chat: Arc<H>,
        clock: Arc<C>,
        task_locks: KeyedLocks<TaskId>,
    ) -> Self {
        Self {
            lifecycle,
            claims,
            users,
            chat,
            clock,
            task_locks,
            reputation_per_approval: EngineConfig::default().reputation_per_approval,
        }
    }

    /// Applies the reputation award from `config`.
    #[must_use]
    pub const fn with_config(mut self, config: &EngineConfig) -> Self {
        self.reputation_per_approval = config.reputation_per_approval;
        self
    }

    /// Returns a claim by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimServiceError::ClaimNotFound`] when the claim does not
    /// exist.
    pub async fn get_claim(&self, claim_id: ClaimId) -> ClaimServiceResult<Claim> {
        self.claims
            .find_by_id(claim_id)
            .await?
            .ok_or(ClaimServiceError::ClaimNotFound(claim_id))
    }

    /// Returns every claim on a task in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimServiceError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn claims_for_task(&self, task_id: TaskId) -> ClaimServiceResult<Vec<Claim>> {
        self.load_task(task_id).await?;
        Ok(self.claims.find_by_task(task_id).await?)
    }

    pub(super) async fn load_task(&self, task_id: TaskId) -> ClaimServiceResult<Task> {
        match self.lifecycle.get_task(task_id).await {
            Ok(task) => Ok(task),
            Err(TaskLifecycleError::NotFound(_)) => Err(ClaimServiceError::TaskNotFound(task_id)),
            Err(err) => Err(err.into()),
        }
    }
}
