//! Escrow ledger entry and its type and status enumerations.

use super::{
    EscrowDomainError, EscrowTransactionId, ParseEscrowTransactionStatusError,
    ParseEscrowTransactionTypeError,
};
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Custody movement recorded by a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowTransactionType {
    /// The owner's reward is taken into custody.
    Lock,
    /// Custody is paid out to the approved claimer.
    Release,
    /// Custody is returned to the owner.
    Refund,
}

impl EscrowTransactionType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Release => "release",
            Self::Refund => "refund",
        }
    }
}

impl fmt::Display for EscrowTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EscrowTransactionType {
    type Error = ParseEscrowTransactionTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lock" => Ok(Self::Lock),
            "release" => Ok(Self::Release),
            "refund" => Ok(Self::Refund),
            _ => Err(ParseEscrowTransactionTypeError(value.to_owned())),
        }
    }
}

/// Bookkeeping status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowTransactionStatus {
    /// Recorded, custody change not yet applied.
    Pending,
    /// Custody change applied.
    Completed,
    /// Custody change could not be applied.
    Failed,
}

impl EscrowTransactionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` when the entry may move to `target`.
    ///
    /// Only pending entries change, and only to a final status.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Pending => matches!(target, Self::Completed | Self::Failed),
            Self::Completed | Self::Failed => false,
        }
    }
}

impl fmt::Display for EscrowTransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EscrowTransactionStatus {
    type Error = ParseEscrowTransactionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseEscrowTransactionStatusError(value.to_owned())),
        }
    }
}

/// Append-only escrow ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowTransaction {
    id: EscrowTransactionId,
    task_id: TaskId,
    user_id: UserId,
    amount: Decimal,
    transaction_type: EscrowTransactionType,
    status: EscrowTransactionStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl EscrowTransaction {
    /// Records a new pending entry.
    #[must_use]
    pub fn new_pending(
        task_id: TaskId,
        user_id: UserId,
        amount: Decimal,
        transaction_type: EscrowTransactionType,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: EscrowTransactionId::new(),
            task_id,
            user_id,
            amount,
            transaction_type,
            status: EscrowTransactionStatus::Pending,
            created_at: clock.utc(),
            completed_at: None,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> EscrowTransactionId {
        self.id
    }

    /// Returns the task whose reward moved.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the user funds moved from or to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the amount moved.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the custody movement type.
    #[must_use]
    pub const fn transaction_type(&self) -> EscrowTransactionType {
        self.transaction_type
    }

    /// Returns the bookkeeping status.
    #[must_use]
    pub const fn status(&self) -> EscrowTransactionStatus {
        self.status
    }

    /// Returns when the entry was recorded.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the entry completed, if it has.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns `true` for a completed entry of the given type.
    #[must_use]
    pub fn is_completed(&self, transaction_type: EscrowTransactionType) -> bool {
        self.transaction_type == transaction_type
            && self.status == EscrowTransactionStatus::Completed
    }

    /// Moves the entry to `next` at instant `at`.
    ///
    /// Completion stamps `completed_at`; failure leaves it empty.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowDomainError::InvalidStatusTransition`] unless the
    /// entry is pending and `next` is a final status.
    pub fn transition_to(
        &mut self,
        next: EscrowTransactionStatus,
        at: DateTime<Utc>,
    ) -> Result<(), EscrowDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(EscrowDomainError::InvalidStatusTransition {
                transaction_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next == EscrowTransactionStatus::Completed {
            self.completed_at = Some(at);
        }
        Ok(())
    }
}
