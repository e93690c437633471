//! In-memory escrow ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::escrow::{
    domain::{EscrowTransaction, EscrowTransactionId, EscrowTransactionStatus},
    ports::{EscrowRepository, EscrowRepositoryError, EscrowRepositoryResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory escrow ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEscrowRepository {
    state: Arc<RwLock<InMemoryEscrowState>>,
}

#[derive(Debug, Default)]
struct InMemoryEscrowState {
    entries: Vec<EscrowTransaction>,
    positions: HashMap<EscrowTransactionId, usize>,
}

impl InMemoryEscrowRepository {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> EscrowRepositoryError {
    EscrowRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl EscrowRepository for InMemoryEscrowRepository {
    async fn append(&self, transaction: &EscrowTransaction) -> EscrowRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if state.positions.contains_key(&transaction.id()) {
            return Err(EscrowRepositoryError::DuplicateTransaction(
                transaction.id(),
            ));
        }
        let position = state.entries.len();
        state.positions.insert(transaction.id(), position);
        state.entries.push(transaction.clone());
        Ok(())
    }

    async fn find_by_task(
        &self,
        task_id: TaskId,
    ) -> EscrowRepositoryResult<Vec<EscrowTransaction>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: EscrowTransactionId,
        next: EscrowTransactionStatus,
        at: DateTime<Utc>,
    ) -> EscrowRepositoryResult<EscrowTransaction> {
        let mut guard = self.state.write().map_err(lock_poisoned)?;
        let state = &mut *guard;
        let entry = state
            .positions
            .get(&id)
            .and_then(|position| state.entries.get_mut(*position))
            .ok_or(EscrowRepositoryError::NotFound(id))?;
        entry.transition_to(next, at)?;
        Ok(entry.clone())
    }
}
