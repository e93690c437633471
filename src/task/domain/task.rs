//! Task aggregate root and its status state machine.

use super::{
    MaxClaimants, ParseTaskStatusError, Reward, TaskDescription, TaskDomainError, TaskId,
    TaskSchedule, TaskTitle,
};
use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepting claims, nobody has claimed yet.
    Open,
    /// At least one claim was admitted.
    Claimed,
    /// An approved claim was settled.
    Completed,
    /// Withdrawn before any settlement.
    Cancelled,
    /// The owner let the owner deadline pass without resolving.
    Disputed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Claimed => "claimed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
        }
    }

    /// Returns `true` when the status permits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns `true` when moving to `target` is in the transition table.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Open => matches!(target, Self::Claimed | Self::Cancelled),
            Self::Claimed => matches!(target, Self::Completed | Self::Disputed),
            Self::Disputed => matches!(target, Self::Completed),
            Self::Completed | Self::Cancelled => false,
        }
    }

    /// Returns `true` when an approved claim may be settled in this status.
    #[must_use]
    pub const fn is_settleable(self) -> bool {
        matches!(self, Self::Claimed | Self::Disputed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "claimed" => Ok(Self::Claimed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "disputed" => Ok(Self::Disputed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task owner.
    pub owner_id: UserId,
    /// Validated title.
    pub title: TaskTitle,
    /// Validated description.
    pub description: TaskDescription,
    /// Reward to hold in escrow.
    pub reward: Reward,
    /// Claimant limit.
    pub max_claimants: MaxClaimants,
    /// Claim and owner deadlines.
    pub schedule: TaskSchedule,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    owner_id: UserId,
    title: TaskTitle,
    description: TaskDescription,
    reward: Reward,
    max_claimants: MaxClaimants,
    schedule: TaskSchedule,
    status: TaskStatus,
    escrow_locked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owner.
    pub owner_id: UserId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: TaskDescription,
    /// Persisted reward.
    pub reward: Reward,
    /// Persisted claimant limit.
    pub max_claimants: MaxClaimants,
    /// Persisted deadlines.
    pub schedule: TaskSchedule,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted escrow custody flag.
    pub escrow_locked: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates an `Open` task whose reward is not yet in escrow.
    #[must_use]
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            owner_id: draft.owner_id,
            title: draft.title,
            description: draft.description,
            reward: draft.reward,
            max_claimants: draft.max_claimants,
            schedule: draft.schedule,
            status: TaskStatus::Open,
            escrow_locked: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            reward: data.reward,
            max_claimants: data.max_claimants,
            schedule: data.schedule,
            status: data.status,
            escrow_locked: data.escrow_locked,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owner.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub const fn description(&self) -> &TaskDescription {
        &self.description
    }

    /// Returns the reward.
    #[must_use]
    pub const fn reward(&self) -> Reward {
        self.reward
    }

    /// Returns the claimant limit.
    #[must_use]
    pub const fn max_claimants(&self) -> MaxClaimants {
        self.max_claimants
    }

    /// Returns the deadlines.
    #[must_use]
    pub const fn schedule(&self) -> &TaskSchedule {
        &self.schedule
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns `true` while the reward is held in escrow.
    #[must_use]
    pub const fn escrow_locked(&self) -> bool {
        self.escrow_locked
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

    /// Returns `true` when a new claim may be admitted at `now`.
    ///
    /// The task must be `Open` or `Claimed`, before its claim deadline, with
    /// its reward locked. Capacity is checked separately by the claim store.
    #[must_use]
    pub fn can_be_claimed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, TaskStatus::Open | TaskStatus::Claimed)
            && !self.schedule.claim_deadline_passed(now)
            && self.escrow_locked
    }

    /// Returns `true` when an unclaimed task has outlived its claim deadline.
    #[must_use]
    pub fn should_auto_cancel(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Open && self.schedule.claim_deadline_passed(now)
    }

    /// Returns `true` when an unresolved task has outlived its owner deadline.
    #[must_use]
    pub fn is_past_owner_deadline(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, TaskStatus::Open | TaskStatus::Claimed)
            && self.schedule.owner_deadline_passed(now)
    }

    /// Moves the task to `next` using the clock for the change timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the move is
    /// not in the transition table.
    pub fn transition_to(
        &mut self,
        next: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_at(next, clock.utc())
    }

    /// Moves the task to `next`, recording `at` as the change timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the move is
    /// not in the transition table.
    pub fn transition_at(
        &mut self,
        next: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    /// Sets or clears the escrow custody flag, recording `at` as the change
    /// timestamp.
    pub const fn set_escrow_locked(&mut self, locked: bool, at: DateTime<Utc>) {
        self.escrow_locked = locked;
        self.updated_at = at;
    }
}
