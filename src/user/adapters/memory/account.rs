//! In-memory repository for user accounts.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::user::{
    domain::{SettlementKey, UserAccount, UserId},
    ports::{UserAccountRepository, UserRepositoryError, UserRepositoryResult},
};

/// Thread-safe in-memory user account repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserAccountRepository {
    state: Arc<RwLock<InMemoryUserState>>,
}

#[derive(Debug, Default)]
struct InMemoryUserState {
    accounts: HashMap<UserId, UserAccount>,
    applied_credits: HashSet<SettlementKey>,
    applied_reputation: HashSet<SettlementKey>,
}

impl InMemoryUserAccountRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write_state(&self) -> UserRepositoryResult<RwLockWriteGuard<'_, InMemoryUserState>> {
        self.state.write().map_err(|err| {
            UserRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Applies `adjust` to the account once per settlement key.
fn adjust_once(
    state: &mut InMemoryUserState,
    id: UserId,
    key: SettlementKey,
    select_applied: fn(&mut InMemoryUserState) -> &mut HashSet<SettlementKey>,
    adjust: impl FnOnce(&mut UserAccount),
) -> UserRepositoryResult<UserAccount> {
    if !state.accounts.contains_key(&id) {
        return Err(UserRepositoryError::NotFound(id));
    }
    let first_application = select_applied(state).insert(key);
    let account = state
        .accounts
        .get_mut(&id)
        .ok_or(UserRepositoryError::NotFound(id))?;
    if first_application {
        adjust(account);
    }
    Ok(account.clone())
}

#[async_trait]
impl UserAccountRepository for InMemoryUserAccountRepository {
    async fn store(&self, account: &UserAccount) -> UserRepositoryResult<()> {
        let mut state = self.write_state()?;
        if state.accounts.contains_key(&account.id()) {
            return Err(UserRepositoryError::DuplicateUser(account.id()));
        }
        state.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn find_or_store(&self, account: &UserAccount) -> UserRepositoryResult<UserAccount> {
        let mut state = self.write_state()?;
        Ok(state
            .accounts
            .entry(account.id())
            .or_insert_with(|| account.clone())
            .clone())
    }

    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<UserAccount>> {
        let state = self.state.read().map_err(|err| {
            UserRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn credit_earnings(
        &self,
        id: UserId,
        amount: Decimal,
        key: SettlementKey,
    ) -> UserRepositoryResult<UserAccount> {
        let mut state = self.write_state()?;
        adjust_once(
            &mut state,
            id,
            key,
            |inner| &mut inner.applied_credits,
            |account| account.credit_earnings(amount),
        )
    }

    async fn increment_reputation(
        &self,
        id: UserId,
        delta: i64,
        key: SettlementKey,
    ) -> UserRepositoryResult<UserAccount> {
        let mut state = self.write_state()?;
        adjust_once(
            &mut state,
            id,
            key,
            |inner| &mut inner.applied_reputation,
            |account| account.add_reputation(delta),
        )
    }
}
