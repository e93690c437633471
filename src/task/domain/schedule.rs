//! Claim and owner deadlines.

use super::TaskDomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two deadlines governing a task.
///
/// Claimers must claim before `claim_deadline`; the owner is expected to
/// resolve submissions before `owner_deadline`, which is strictly later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchedule {
    claim_deadline: DateTime<Utc>,
    owner_deadline: DateTime<Utc>,
}

impl TaskSchedule {
    /// Creates a schedule for a task being created at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ClaimDeadlineNotInFuture`] unless the claim
    /// deadline is after `now`, and
    /// [`TaskDomainError::OwnerDeadlineNotAfterClaimDeadline`] unless the
    /// owner deadline is after the claim deadline.
    pub fn new(
        claim_deadline: DateTime<Utc>,
        owner_deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        if claim_deadline <= now {
            return Err(TaskDomainError::ClaimDeadlineNotInFuture {
                claim_deadline,
                now,
            });
        }
        Self::restore(claim_deadline, owner_deadline)
    }

    /// Rebuilds a persisted schedule, checking only deadline ordering.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OwnerDeadlineNotAfterClaimDeadline`] unless
    /// the owner deadline is after the claim deadline.
    pub fn restore(
        claim_deadline: DateTime<Utc>,
        owner_deadline: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        if owner_deadline <= claim_deadline {
            return Err(TaskDomainError::OwnerDeadlineNotAfterClaimDeadline {
                claim_deadline,
                owner_deadline,
            });
        }
        Ok(Self {
            claim_deadline,
            owner_deadline,
        })
    }

    /// Returns the claim deadline.
    #[must_use]
    pub const fn claim_deadline(&self) -> DateTime<Utc> {
        self.claim_deadline
    }

    /// Returns the owner deadline.
    #[must_use]
    pub const fn owner_deadline(&self) -> DateTime<Utc> {
        self.owner_deadline
    }

    /// Returns `true` once `now` has reached the claim deadline.
    #[must_use]
    pub fn claim_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now >= self.claim_deadline
    }

    /// Returns `true` once `now` has reached the owner deadline.
    #[must_use]
    pub fn owner_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now >= self.owner_deadline
    }
}
