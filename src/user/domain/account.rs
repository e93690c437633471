//! User account aggregate.

use super::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cumulative earnings, spending, and reputation for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    id: UserId,
    reputation: i64,
    total_earned: Decimal,
    total_spent: Decimal,
    created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Opens an empty account.
    #[must_use]
    pub fn new(id: UserId, clock: &impl Clock) -> Self {
        Self {
            id,
            reputation: 0,
            total_earned: Decimal::ZERO,
            total_spent: Decimal::ZERO,
            created_at: clock.utc(),
        }
    }

    /// Returns the account owner.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the reputation score.
    #[must_use]
    pub const fn reputation(&self) -> i64 {
        self.reputation
    }

    /// Returns the total amount earned from approved claims.
    #[must_use]
    pub const fn total_earned(&self) -> Decimal {
        self.total_earned
    }

    /// Returns the total amount spent on tasks.
    #[must_use]
    pub const fn total_spent(&self) -> Decimal {
        self.total_spent
    }

    /// Returns when the account was opened.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Adds `amount` to the earnings total.
    pub fn credit_earnings(&mut self, amount: Decimal) {
        self.total_earned = self.total_earned.saturating_add(amount);
    }

    /// Adds `delta` to the reputation score.
    pub const fn add_reputation(&mut self, delta: i64) {
        self.reputation = self.reputation.saturating_add(delta);
    }
}
