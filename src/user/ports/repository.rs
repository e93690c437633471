//! Repository port for user accounts.

use crate::user::domain::{SettlementKey, UserAccount, UserId};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Result type for user account repository operations.
pub type UserRepositoryResult<T> = Result<T, UserRepositoryError>;

/// User account persistence contract.
#[async_trait]
pub trait UserAccountRepository: Send + Sync {
    /// Stores a new account.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::DuplicateUser`] when the account exists.
    async fn store(&self, account: &UserAccount) -> UserRepositoryResult<()>;

    /// Returns the stored account for `account.id()`, storing `account`
    /// first when none exists.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::Persistence`] when the store fails.
    async fn find_or_store(&self, account: &UserAccount) -> UserRepositoryResult<UserAccount>;

    /// Finds an account by user identifier.
    ///
    /// Returns `None` when the account does not exist.
    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<UserAccount>>;

    /// Adds `amount` to the user's earnings unless `key` was already applied.
    ///
    /// Returns the account after the (possibly skipped) adjustment.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::NotFound`] when the account does not
    /// exist.
    async fn credit_earnings(
        &self,
        id: UserId,
        amount: Decimal,
        key: SettlementKey,
    ) -> UserRepositoryResult<UserAccount>;

    /// Adds `delta` to the user's reputation unless `key` was already applied.
    ///
    /// Returns the account after the (possibly skipped) adjustment.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::NotFound`] when the account does not
    /// exist.
    async fn increment_reputation(
        &self,
        id: UserId,
        delta: i64,
        key: SettlementKey,
    ) -> UserRepositoryResult<UserAccount>;
}

/// Errors returned by user account repository implementations.
#[derive(Debug, Clone, Error)]
pub enum UserRepositoryError {
    /// An account with the same identifier already exists.
    #[error("duplicate user account: {0}")]
    DuplicateUser(UserId),

    /// The account was not found.
    #[error("user not found: {0}")]
    NotFound(UserId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl UserRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
