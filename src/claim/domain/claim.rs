//! Claim aggregate and its status state machine.

use super::{ClaimDomainError, ClaimId, CompletionSubmission, ParseClaimStatusError};
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claim lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Admitted and awaiting resolution.
    Pending,
    /// Approved by the task owner.
    Approved,
    /// Rejected by the task owner.
    Rejected,
    /// Withdrawn; frees the claimant slot.
    Cancelled,
}

impl ClaimStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when moving to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Pending => matches!(target, Self::Approved | Self::Rejected | Self::Cancelled),
            Self::Approved | Self::Rejected | Self::Cancelled => false,
        }
    }

    /// Returns `true` when the claim occupies a claimant slot.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ClaimStatus {
    type Error = ParseClaimStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseClaimStatusError(value.to_owned())),
        }
    }
}

/// A claimer's commitment to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    id: ClaimId,
    task_id: TaskId,
    claimer_id: UserId,
    status: ClaimStatus,
    submission: Option<CompletionSubmission>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a pending claim without a submission.
    #[must_use]
    pub fn new(task_id: TaskId, claimer_id: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ClaimId::new(),
            task_id,
            claimer_id,
            status: ClaimStatus::Pending,
            submission: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the claim identifier.
    #[must_use]
    pub const fn id(&self) -> ClaimId {
        self.id
    }

    /// Returns the claimed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the claimer.
    #[must_use]
    pub const fn claimer_id(&self) -> UserId {
        self.claimer_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ClaimStatus {
        self.status
    }

    /// Returns the completion submission, if any.
    #[must_use]
    pub const fn submission(&self) -> Option<&CompletionSubmission> {
        self.submission.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the claim occupies a claimant slot.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns `true` once completion evidence has been submitted.
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        self.submission.is_some()
    }

    /// Moves the claim to `next`, recording `at` as the change timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimDomainError::InvalidStatusTransition`] unless the claim
    /// is pending.
    pub fn transition_at(
        &mut self,
        next: ClaimStatus,
        at: DateTime<Utc>,
    ) -> Result<(), ClaimDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(ClaimDomainError::InvalidStatusTransition {
                claim_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    /// Attaches or replaces the completion submission.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimDomainError::NotPending`] once the claim is resolved.
    pub fn record_submission(
        &mut self,
        submission: CompletionSubmission,
        at: DateTime<Utc>,
    ) -> Result<(), ClaimDomainError> {
        if self.status != ClaimStatus::Pending {
            return Err(ClaimDomainError::NotPending {
                claim_id: self.id,
                status: self.status,
            });
        }
        self.submission = Some(submission);
        self.updated_at = at;
        Ok(())
    }
}
