//! Account provisioning and lookup.

use crate::error::ErrorKind;
use crate::user::{
    domain::{UserAccount, UserId},
    ports::{UserAccountRepository, UserRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Service-level errors for account operations.
#[derive(Debug, Error)]
pub enum UserAccountError {
    /// The account does not exist.
    #[error("user not found: {0}")]
    NotFound(UserId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] UserRepositoryError),
}

impl UserAccountError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repository(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for account service operations.
pub type UserAccountResult<T> = Result<T, UserAccountError>;

/// Opens and reads user accounts.
pub struct UserAccountService<U, C>
where
    U: UserAccountRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<U>,
    clock: Arc<C>,
}

impl<U, C> Clone for UserAccountService<U, C>
where
    U: UserAccountRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<U, C> UserAccountService<U, C>
where
    U: UserAccountRepository,
    C: Clock + Send + Sync,
{
    /// Creates an account service.
    #[must_use]
    pub const fn new(repository: Arc<U>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Returns the user's account, opening an empty one on first use.
    ///
    /// # Errors
    ///
    /// Returns [`UserAccountError::Repository`] when the store fails.
    pub async fn get_or_create_account(&self, id: UserId) -> UserAccountResult<UserAccount> {
        let account = self
            .repository
            .find_or_store(&UserAccount::new(id, &*self.clock))
            .await?;
        debug!(user_id = %id, "account ready");
        Ok(account)
    }

    /// Returns an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`UserAccountError::NotFound`] when the user has no account.
    pub async fn get_account(&self, id: UserId) -> UserAccountResult<UserAccount> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserAccountError::NotFound(id))
    }
}
