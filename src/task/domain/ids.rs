//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TaskId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly positive reward held in escrow for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Reward(Decimal);

impl Reward {
    /// Creates a validated reward.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NonPositiveReward`] when the amount is zero
    /// or negative.
    pub fn new(amount: Decimal) -> Result<Self, TaskDomainError> {
        if amount <= Decimal::ZERO {
            return Err(TaskDomainError::NonPositiveReward(amount));
        }
        Ok(Self(amount))
    }

    /// Returns the reward amount.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Reward {
    type Error = TaskDomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Reward> for Decimal {
    fn from(value: Reward) -> Self {
        value.0
    }
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upper bound on concurrently active claims for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MaxClaimants(u32);

impl MaxClaimants {
    /// Creates a validated claimant limit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ZeroMaxClaimants`] when `value` is zero.
    pub const fn new(value: u32) -> Result<Self, TaskDomainError> {
        if value == 0 {
            return Err(TaskDomainError::ZeroMaxClaimants);
        }
        Ok(Self(value))
    }

    /// Returns the limit.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the limit as a collection size.
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl TryFrom<u32> for MaxClaimants {
    type Error = TaskDomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaxClaimants> for u32 {
    fn from(value: MaxClaimants) -> Self {
        value.0
    }
}

impl fmt::Display for MaxClaimants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
