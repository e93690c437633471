//! Caller-facing surface over the task, claim, account, and reconcile
//! services.
//!
//! [`TaskBroker`] wires the services onto one set of stores and one clock
//! so that every entry point shares the same per-task locks. Errors from the
//! individual services are unified as [`BrokerError`], which keeps their
//! [`ErrorKind`] classification.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use chrono::{Duration as ChronoDuration, Utc};
//! use rust_decimal::Decimal;
//! use taskvault::broker::{within, InMemoryTaskBroker};
//! use taskvault::config::EngineConfig;
//! use taskvault::task::services::CreateTaskRequest;
//! use taskvault::user::domain::UserId;
//!
//! # async fn demo() -> Result<(), taskvault::broker::BrokerError> {
//! let broker = InMemoryTaskBroker::in_memory(&EngineConfig::default());
//! let now = Utc::now();
//! let request = CreateTaskRequest::new(
//!     "Paint the fence",
//!     "Two coats, white",
//!     Decimal::new(2_500, 2),
//!     now + ChronoDuration::hours(4),
//!     now + ChronoDuration::days(1),
//! );
//! let task = within(Duration::from_secs(2), broker.create_task(UserId::new(), request)).await?;
//! broker.claim_task(task.id(), UserId::new()).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use thiserror::Error;

use crate::claim::{
    adapters::memory::{InMemoryChatChannels, InMemoryClaimRepository},
    domain::{Claim, ClaimId},
    ports::{ChatChannelPort, ClaimRepository},
    services::{ClaimOutcome, ClaimService, ClaimServiceError},
};
use crate::config::EngineConfig;
use crate::error::ErrorKind;
use crate::escrow::{adapters::memory::InMemoryEscrowRepository, ports::EscrowRepository};
use crate::keyed_lock::KeyedLocks;
use crate::reconcile::{ReconcileError, ReconciliationReport, Reconciler};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Task, TaskId},
    ports::TaskRepository,
    services::{CreateTaskRequest, TaskLifecycleError, TaskLifecycleService},
};
use crate::user::{
    adapters::memory::InMemoryUserAccountRepository,
    domain::{UserAccount, UserId},
    ports::UserAccountRepository,
    services::{UserAccountError, UserAccountService},
};

/// Errors surfaced by [`TaskBroker`].
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A task lifecycle operation failed.
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),

    /// A claim operation failed.
    #[error(transparent)]
    Claim(#[from] ClaimServiceError),

    /// An account operation failed.
    #[error(transparent)]
    Account(#[from] UserAccountError),

    /// A reconciliation pass could not run.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The caller's deadline elapsed before the operation finished.
    #[error("operation did not finish within {0:?}")]
    DeadlineElapsed(Duration),
}

impl BrokerError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Lifecycle(err) => err.kind(),
            Self::Claim(err) => err.kind(),
            Self::Account(err) => err.kind(),
            Self::Reconcile(err) => err.kind(),
            Self::DeadlineElapsed(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Runs `operation`, failing with [`BrokerError::DeadlineElapsed`] when it
/// does not finish within `deadline`.
///
/// Steps the operation already committed are kept; an interrupted approval
/// is finished by approving again.
///
/// # Errors
///
/// Returns the operation's own error, or [`BrokerError::DeadlineElapsed`].
pub async fn within<F, T, Fail>(deadline: Duration, operation: F) -> BrokerResult<T>
where
    F: Future<Output = Result<T, Fail>>,
    BrokerError: From<Fail>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result.map_err(BrokerError::from),
        Err(_) => Err(BrokerError::DeadlineElapsed(deadline)),
    }
}

/// Stores backing a [`TaskBroker`].
#[derive(Debug)]
pub struct BrokerStores<T, E, R, U, H> {
    /// Task store.
    pub tasks: Arc<T>,
    /// Escrow ledger store.
    pub ledger: Arc<E>,
    /// Claim store.
    pub claims: Arc<R>,
    /// User account store.
    pub users: Arc<U>,
    /// Chat channel collaborator.
    pub chat: Arc<H>,
}

/// Broker over the in-memory adapters.
pub type InMemoryTaskBroker<C = DefaultClock> = TaskBroker<
    InMemoryTaskRepository,
    InMemoryEscrowRepository,
    InMemoryClaimRepository,
    InMemoryUserAccountRepository,
    InMemoryChatChannels,
    C,
>;

/// Entry point for every task, claim, account, and reconciliation operation.
pub struct TaskBroker<T, E, R, U, H, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    U: UserAccountRepository,
    H: ChatChannelPort,
    C: Clock + Send + Sync,
{
    lifecycle: TaskLifecycleService<T, E, C>,
    claims: ClaimService<T, E, R, U, H, C>,
    accounts: UserAccountService<U, C>,
    reconciler: Reconciler<T, E, R, C>,
}

impl<T, E, R, U, H, C> Clone for TaskBroker<T, E, R, U, H, C>
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
            claims: self.claims.clone(),
            accounts: self.accounts.clone(),
            reconciler: self.reconciler.clone(),
        }
    }
}

impl InMemoryTaskBroker {
    /// Creates a broker over fresh in-memory stores and the system clock.
    #[must_use]
    pub fn in_memory(config: &EngineConfig) -> Self {
        Self::new(BrokerStores::in_memory(), Arc::new(DefaultClock), config)
    }
}

impl
    BrokerStores<
        InMemoryTaskRepository,
        InMemoryEscrowRepository,
        InMemoryClaimRepository,
        InMemoryUserAccountRepository,
        InMemoryChatChannels,
    >
{
    /// Creates a fresh set of empty in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            tasks: Arc::new(InMemoryTaskRepository::new()),
            ledger: Arc::new(InMemoryEscrowRepository::new()),
            claims: Arc::new(InMemoryClaimRepository::new()),
            users: Arc::new(InMemoryUserAccountRepository::new()),
            chat: Arc::new(InMemoryChatChannels::new()),
        }
    }
}

impl<T, E, R, U, H, C> TaskBroker<T, E, R, U, H, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    U: UserAccountRepository,
    H: ChatChannelPort,
    C: Clock + Send + Sync,
{
    /// Wires the services over `stores` with one shared set of task locks.
    #[must_use]
    pub fn new(stores: BrokerStores<T, E, R, U, H>, clock: Arc<C>, config: &EngineConfig) -> Self {
        let task_locks = KeyedLocks::new();
        let lifecycle =
            TaskLifecycleService::new(stores.tasks, stores.ledger, Arc::clone(&clock))
                .with_config(config);
        let accounts = UserAccountService::new(Arc::clone(&stores.users), Arc::clone(&clock));
        let claims = ClaimService::new(
            lifecycle.clone(),
            Arc::clone(&stores.claims),
            stores.users,
            stores.chat,
            Arc::clone(&clock),
            task_locks.clone(),
        )
        .with_config(config);
        let reconciler = Reconciler::new(lifecycle.clone(), stores.claims, clock, task_locks)
            .with_config(config.reconciler);
        Self {
            lifecycle,
            claims,
            accounts,
            reconciler,
        }
    }

    /// Returns the reconciler sharing this broker's stores and locks.
    #[must_use]
    pub const fn reconciler(&self) -> &Reconciler<T, E, R, C> {
        &self.reconciler
    }

    /// Creates a task and locks its reward in escrow.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycleService::create_task`].
    pub async fn create_task(
        &self,
        owner: UserId,
        request: CreateTaskRequest,
    ) -> BrokerResult<Task> {
        Ok(self.lifecycle.create_task(owner, request).await?)
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for an unknown task.
    pub async fn get_task(&self, task_id: TaskId) -> BrokerResult<Task> {
        Ok(self.lifecycle.get_task(task_id).await?)
    }

    /// Lists claimable open tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error when the store fails.
    pub async fn open_tasks(&self, limit: i64, offset: i64) -> BrokerResult<Vec<Task>> {
        Ok(self.lifecycle.open_tasks(limit, offset).await?)
    }

    /// Lists an owner's tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error when the store fails.
    pub async fn owner_tasks(
        &self,
        owner: UserId,
        limit: i64,
        offset: i64,
    ) -> BrokerResult<Vec<Task>> {
        Ok(self.lifecycle.owner_tasks(owner, limit, offset).await?)
    }

    /// Claims a task for `claimer`.
    ///
    /// # Errors
    ///
    /// See [`ClaimService::claim_task`].
    pub async fn claim_task(&self, task_id: TaskId, claimer: UserId) -> BrokerResult<ClaimOutcome> {
        Ok(self.claims.claim_task(task_id, claimer).await?)
    }

    /// Returns a claim by identifier.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for an unknown claim.
    pub async fn get_claim(&self, claim_id: ClaimId) -> BrokerResult<Claim> {
        Ok(self.claims.get_claim(claim_id).await?)
    }

    /// Lists every claim on a task in creation order.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for an unknown task.
    pub async fn claims_for_task(&self, task_id: TaskId) -> BrokerResult<Vec<Claim>> {
        Ok(self.claims.claims_for_task(task_id).await?)
    }

    /// Records completion evidence on a pending claim.
    ///
    /// # Errors
    ///
    /// See [`ClaimService::submit_completion`].
    pub async fn submit_completion(
        &self,
        claim_id: ClaimId,
        user: UserId,
        text: impl Into<String> + Send,
        image_url: Option<String>,
    ) -> BrokerResult<Claim> {
        Ok(self
            .claims
            .submit_completion(claim_id, user, text, image_url)
            .await?)
    }

    /// Approves a submitted claim and settles it.
    ///
    /// # Errors
    ///
    /// See [`ClaimService::approve_claim`].
    pub async fn approve_claim(&self, claim_id: ClaimId, owner: UserId) -> BrokerResult<Claim> {
        Ok(self.claims.approve_claim(claim_id, owner).await?)
    }

    /// Rejects a pending claim.
    ///
    /// # Errors
    ///
    /// See [`ClaimService::reject_claim`].
    pub async fn reject_claim(&self, claim_id: ClaimId, owner: UserId) -> BrokerResult<Claim> {
        Ok(self.claims.reject_claim(claim_id, owner).await?)
    }

    /// Returns the user's account, opening an empty one on first use.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error when the store fails.
    pub async fn get_or_create_account(&self, user: UserId) -> BrokerResult<UserAccount> {
        Ok(self.accounts.get_or_create_account(user).await?)
    }

    /// Returns an existing account.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error when the user has no account.
    pub async fn get_account(&self, user: UserId) -> BrokerResult<UserAccount> {
        Ok(self.accounts.get_account(user).await?)
    }

    /// Runs one reconciliation pass now.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Reconcile`] when a candidate query fails.
    pub async fn run_reconciliation_pass(&self) -> BrokerResult<ReconciliationReport> {
        Ok(self.reconciler.run_pass().await?)
    }
}
