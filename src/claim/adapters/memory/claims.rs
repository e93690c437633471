//! In-memory claim repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::claim::{
    domain::{Claim, ClaimId, ClaimStatus, CompletionSubmission},
    ports::{AdmissionRecord, ClaimRepository, ClaimRepositoryError, ClaimRepositoryResult},
};
use crate::task::domain::TaskId;
use crate::user::domain::UserId;

/// Thread-safe in-memory claim repository.
///
/// Conditional inserts and status updates each run under a single write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClaimRepository {
    state: Arc<RwLock<InMemoryClaimState>>,
}

#[derive(Debug, Default)]
struct InMemoryClaimState {
    claims: HashMap<ClaimId, Claim>,
    task_index: HashMap<TaskId, Vec<ClaimId>>,
}

impl InMemoryClaimState {
    fn claims_on(&self, task_id: TaskId) -> impl Iterator<Item = &Claim> {
        self.task_index
            .get(&task_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.claims.get(id))
    }

    fn active_on(&self, task_id: TaskId) -> impl Iterator<Item = &Claim> {
        self.claims_on(task_id).filter(|claim| claim.is_active())
    }
}

impl InMemoryClaimRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> ClaimRepositoryResult<RwLockReadGuard<'_, InMemoryClaimState>> {
        self.state.read().map_err(|err| {
            ClaimRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(&self) -> ClaimRepositoryResult<RwLockWriteGuard<'_, InMemoryClaimState>> {
        self.state.write().map_err(|err| {
            ClaimRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl ClaimRepository for InMemoryClaimRepository {
    async fn create_within_capacity(
        &self,
        claim: &Claim,
        capacity: usize,
    ) -> ClaimRepositoryResult<AdmissionRecord> {
        let mut state = self.write_state()?;
        if let Some(existing) = state
            .active_on(claim.task_id())
            .find(|active| active.claimer_id() == claim.claimer_id())
        {
            return Ok(AdmissionRecord::Existing(existing.clone()));
        }
        let prior_active = state.active_on(claim.task_id()).count();
        if prior_active >= capacity {
            return Ok(AdmissionRecord::AtCapacity {
                active: prior_active,
            });
        }
        if state.claims.contains_key(&claim.id()) {
            return Err(ClaimRepositoryError::DuplicateClaim(claim.id()));
        }

        state
            .task_index
            .entry(claim.task_id())
            .or_default()
            .push(claim.id());
        state.claims.insert(claim.id(), claim.clone());
        Ok(AdmissionRecord::Inserted {
            claim: claim.clone(),
            prior_active,
        })
    }

    async fn find_by_id(&self, id: ClaimId) -> ClaimRepositoryResult<Option<Claim>> {
        let state = self.read_state()?;
        Ok(state.claims.get(&id).cloned())
    }

    async fn find_by_task(&self, task_id: TaskId) -> ClaimRepositoryResult<Vec<Claim>> {
        let state = self.read_state()?;
        Ok(state.claims_on(task_id).cloned().collect())
    }

    async fn find_active_by_task_and_claimer(
        &self,
        task_id: TaskId,
        claimer: UserId,
    ) -> ClaimRepositoryResult<Option<Claim>> {
        let state = self.read_state()?;
        Ok(state
            .active_on(task_id)
            .find(|claim| claim.claimer_id() == claimer)
            .cloned())
    }

    async fn count_active_by_task(&self, task_id: TaskId) -> ClaimRepositoryResult<usize> {
        let state = self.read_state()?;
        Ok(state.active_on(task_id).count())
    }

    async fn update_status(
        &self,
        id: ClaimId,
        expected: ClaimStatus,
        next: ClaimStatus,
        at: DateTime<Utc>,
    ) -> ClaimRepositoryResult<Claim> {
        let mut state = self.write_state()?;
        let claim = state
            .claims
            .get_mut(&id)
            .ok_or(ClaimRepositoryError::NotFound(id))?;
        let conflict = ClaimRepositoryError::StatusConflict {
            claim_id: id,
            expected,
            actual: claim.status(),
        };
        if claim.status() != expected {
            return Err(conflict);
        }
        claim.transition_at(next, at).map_err(|_| conflict)?;
        Ok(claim.clone())
    }

    async fn record_submission(
        &self,
        id: ClaimId,
        submission: CompletionSubmission,
        at: DateTime<Utc>,
    ) -> ClaimRepositoryResult<Claim> {
        let mut state = self.write_state()?;
        let claim = state
            .claims
            .get_mut(&id)
            .ok_or(ClaimRepositoryError::NotFound(id))?;
        let conflict = ClaimRepositoryError::StatusConflict {
            claim_id: id,
            expected: ClaimStatus::Pending,
            actual: claim.status(),
        };
        claim.record_submission(submission, at).map_err(|_| conflict)?;
        Ok(claim.clone())
    }
}
