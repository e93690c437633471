//! Service layer for task creation, retrieval and status changes.

use crate::config::{EngineConfig, PageLimits};
use crate::error::ErrorKind;
use crate::escrow::{
    ports::EscrowRepository,
    services::{LedgerError, LedgerService},
};
use crate::task::{
    domain::{
        MaxClaimants, Reward, Task, TaskDescription, TaskDomainError, TaskDraft, TaskId,
        TaskSchedule, TaskStatus, TaskTitle,
    },
    ports::{Page, TaskRepository, TaskRepositoryError},
};
use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    reward: Decimal,
    max_claimants: u32,
    claim_deadline: DateTime<Utc>,
    owner_deadline: DateTime<Utc>,
}

impl CreateTaskRequest {
    /// Creates a request for a single-claimant task.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        reward: Decimal,
        claim_deadline: DateTime<Utc>,
        owner_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            reward,
            max_claimants: 1,
            claim_deadline,
            owner_deadline,
        }
    }

    /// Sets the maximum number of concurrently active claims.
    #[must_use]
    pub const fn with_max_claimants(mut self, max_claimants: u32) -> Self {
        self.max_claimants = max_claimants;
        self
    }

    fn into_draft(
        self,
        owner_id: UserId,
        now: DateTime<Utc>,
        max_title_chars: usize,
    ) -> Result<TaskDraft, TaskDomainError> {
        Ok(TaskDraft {
            owner_id,
            title: TaskTitle::new(self.title, max_title_chars)?,
            description: TaskDescription::new(self.description)?,
            reward: Reward::new(self.reward)?,
            max_claimants: MaxClaimants::new(self.max_claimants)?,
            schedule: TaskSchedule::new(self.claim_deadline, self.owner_deadline, now)?,
        })
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The escrow lock for a new task failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

impl TaskLifecycleError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Repository(err) => err.kind(),
            Self::Ledger(err) => err.kind(),
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<T, E, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<T>,
    ledger: LedgerService<E, T, C>,
    clock: Arc<C>,
    max_title_chars: usize,
    page_limits: PageLimits,
}

impl<T, E, C> Clone for TaskLifecycleService<T, E, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            ledger: self.ledger.clone(),
            clock: Arc::clone(&self.clock),
            max_title_chars: self.max_title_chars,
            page_limits: self.page_limits,
        }
    }
}

impl<T, E, C> TaskLifecycleService<T, E, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a task lifecycle service with default limits.
    #[must_use]
    pub fn new(repository: Arc<T>, ledger: Arc<E>, clock: Arc<C>) -> Self {
        let defaults = EngineConfig::default();
        Self {
            ledger: LedgerService::new(ledger, Arc::clone(&repository), Arc::clone(&clock)),
            repository,
            clock,
            max_title_chars: defaults.max_title_chars,
            page_limits: defaults.page_limits,
        }
    }

    /// Applies the title and pagination limits from `config`.
    #[must_use]
    pub const fn with_config(mut self, config: &EngineConfig) -> Self {
        self.max_title_chars = config.max_title_chars;
        self.page_limits = config.page_limits;
        self
    }

    /// Returns the escrow ledger service sharing this service's stores.
    #[must_use]
    pub const fn ledger(&self) -> &LedgerService<E, T, C> {
        &self.ledger
    }

    /// Creates an `Open` task for `owner` and locks its reward in escrow.
    ///
    /// Returns the task as persisted after the lock. When the lock fails the
    /// task is cancelled and the ledger error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for invalid input,
    /// [`TaskLifecycleError::Ledger`] when the escrow lock fails, or
    /// [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn create_task(
        &self,
        owner: UserId,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let draft = request.into_draft(owner, self.clock.utc(), self.max_title_chars)?;
        let task = Task::new(draft, &*self.clock);
        self.repository.store(&task).await?;

        match self
            .ledger
            .lock_escrow(task.id(), owner, task.reward().value())
            .await
        {
            Ok(locked) => {
                info!(
                    task_id = %locked.id(),
                    %owner,
                    reward = %locked.reward(),
                    max_claimants = %locked.max_claimants(),
                    "task created"
                );
                Ok(locked)
            }
            Err(err) => {
                warn!(task_id = %task.id(), error = %err, "escrow lock failed, cancelling task");
                if let Err(cancel_err) = self
                    .transition_status(task.id(), TaskStatus::Cancelled)
                    .await
                {
                    warn!(
                        task_id = %task.id(),
                        error = %cancel_err,
                        "failed to cancel task after escrow lock failure"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist.
    pub async fn get_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    /// Lists claimable-by-deadline `Open` tasks, newest first.
    ///
    /// Out-of-range `limit` values fall back to the configured default and
    /// negative offsets to zero.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the query fails.
    pub async fn open_tasks(&self, limit: i64, offset: i64) -> TaskLifecycleResult<Vec<Task>> {
        let page = self.page(limit, offset);
        Ok(self.repository.find_open(self.clock.utc(), page).await?)
    }

    /// Lists the owner's tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the query fails.
    pub async fn owner_tasks(
        &self,
        owner: UserId,
        limit: i64,
        offset: i64,
    ) -> TaskLifecycleResult<Vec<Task>> {
        let page = self.page(limit, offset);
        Ok(self.repository.find_by_owner(owner, page).await?)
    }

    /// Moves a task to `next` if the transition table allows it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for a disallowed transition and
    /// [`TaskLifecycleError::Repository`] with
    /// [`TaskRepositoryError::StatusConflict`] when a concurrent writer
    /// changed the status first.
    pub async fn transition_status(
        &self,
        task_id: TaskId,
        next: TaskStatus,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let previous = task.status();
        task.transition_to(next, &*self.clock)?;
        let updated = self
            .repository
            .update_status(task_id, previous, next, task.updated_at())
            .await?;
        info!(%task_id, from = %previous, to = %next, "task status changed");
        Ok(updated)
    }

    /// Returns `Open` tasks whose claim deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the query fails.
    pub async fn tasks_past_claim_deadline(&self) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self
            .repository
            .find_past_claim_deadline(self.clock.utc())
            .await?)
    }

    /// Returns unresolved tasks whose owner deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the query fails.
    pub async fn tasks_past_owner_deadline(&self) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self
            .repository
            .find_past_owner_deadline(self.clock.utc())
            .await?)
    }

    fn page(&self, limit: i64, offset: i64) -> Page {
        Page::new(
            self.page_limits.clamp_limit(limit),
            PageLimits::clamp_offset(offset),
        )
    }
}
