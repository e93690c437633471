//! Repository port for task persistence and lifecycle queries.

use crate::error::ErrorKind;
use crate::task::domain::{Task, TaskId, TaskStatus};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// A window of a newest-first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows returned.
    pub limit: usize,
    /// Number of rows skipped.
    pub offset: usize,
}

impl Page {
    /// Creates a page window.
    #[must_use]
    pub const fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

/// Task persistence contract.
///
/// Listings are ordered newest first by creation time.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns a page of the owner's tasks.
    async fn find_by_owner(&self, owner: UserId, page: Page) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns a page of `Open` tasks whose claim deadline is after `now`.
    async fn find_open(&self, now: DateTime<Utc>, page: Page) -> TaskRepositoryResult<Vec<Task>>;

    /// Moves the task to `next` only while its stored status is `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for an unknown task and
    /// [`TaskRepositoryError::StatusConflict`] when another writer changed
    /// the status first.
    async fn update_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task>;

    /// Sets or clears the escrow custody flag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for an unknown task.
    async fn set_escrow_locked(
        &self,
        id: TaskId,
        locked: bool,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task>;

    /// Returns `Open` tasks whose claim deadline is at or before `now`.
    async fn find_past_claim_deadline(&self, now: DateTime<Utc>)
    -> TaskRepositoryResult<Vec<Task>>;

    /// Returns `Open` or `Claimed` tasks whose owner deadline is at or
    /// before `now`.
    async fn find_past_owner_deadline(&self, now: DateTime<Utc>)
    -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored status differed from the expected one.
    #[error("task {task_id} status is {actual}, expected {expected}")]
    StatusConflict {
        /// Task being updated.
        task_id: TaskId,
        /// Status the writer expected.
        expected: TaskStatus,
        /// Status actually stored.
        actual: TaskStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
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
            Self::DuplicateTask(_) | Self::Persistence(_) => ErrorKind::Internal,
        }
    }
}
