//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned while constructing or transitioning domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The title exceeds the configured character limit.
    #[error("task title has {length} characters, at most {max} allowed")]
    TitleTooLong {
        /// Character count of the trimmed title.
        length: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The reward is zero or negative.
    #[error("task reward must be positive, got {0}")]
    NonPositiveReward(Decimal),

    /// The maximum number of claimants is zero.
    #[error("max claimants must be at least 1")]
    ZeroMaxClaimants,

    /// The claim deadline is not in the future.
    #[error("claim deadline {claim_deadline} must be after {now}")]
    ClaimDeadlineNotInFuture {
        /// Requested claim deadline.
        claim_deadline: DateTime<Utc>,
        /// Instant of validation.
        now: DateTime<Utc>,
    },

    /// The owner deadline does not follow the claim deadline.
    #[error("owner deadline {owner_deadline} must be after claim deadline {claim_deadline}")]
    OwnerDeadlineNotAfterClaimDeadline {
        /// Requested claim deadline.
        claim_deadline: DateTime<Utc>,
        /// Requested owner deadline.
        owner_deadline: DateTime<Utc>,
    },

    /// The status change is not in the transition table.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Task being updated.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

impl TaskDomainError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidStatusTransition { .. } => ErrorKind::StateConflict,
            Self::EmptyTitle
            | Self::TitleTooLong { .. }
            | Self::EmptyDescription
            | Self::NonPositiveReward(_)
            | Self::ZeroMaxClaimants
            | Self::ClaimDeadlineNotInFuture { .. }
            | Self::OwnerDeadlineNotAfterClaimDeadline { .. } => ErrorKind::Validation,
        }
    }
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
