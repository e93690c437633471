//! Claim admission.

use mockable::Clock;
use tracing::{debug, info};

use super::claims::{ClaimOutcome, ClaimService, ClaimServiceError, ClaimServiceResult};
use crate::claim::{
    domain::Claim,
    ports::{AdmissionRecord, ChatChannelPort, ClaimRepository},
};
use crate::escrow::ports::EscrowRepository;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::TaskRepository,
};
use crate::user::{domain::UserId, ports::UserAccountRepository};

impl<T, E, R, U, H, C> ClaimService<T, E, R, U, H, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    U: UserAccountRepository,
    H: ChatChannelPort,
    C: Clock + Send + Sync,
{
    /// Admits `claimer` to the task if it is claimable and below capacity.
    ///
    /// A claimer who already holds an active claim gets it back as
    /// [`ClaimOutcome::AlreadyClaimed`]. The first admitted claim moves the
    /// task from `Open` to `Claimed`; a task left `Open` while holding active
    /// claims is moved on the next request.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimServiceError::TaskNotFound`],
    /// [`ClaimServiceError::TaskNotClaimable`] when the task is past its claim
    /// deadline, unfunded or resolved, and
    /// [`ClaimServiceError::ClaimLimitReached`] when its active claims fill
    /// the claimant limit.
    pub async fn claim_task(
        &self,
        task_id: TaskId,
        claimer: UserId,
    ) -> ClaimServiceResult<ClaimOutcome> {
        self.load_task(task_id).await?;
        let _guard = self.task_locks.acquire(task_id).await;

        let task = self.load_task(task_id).await?;
        if !task.can_be_claimed(self.clock.utc()) {
            return Err(ClaimServiceError::TaskNotClaimable {
                task_id,
                status: task.status(),
            });
        }

        let candidate = Claim::new(task_id, claimer, &*self.clock);
        let record = self
            .claims
            .create_within_capacity(&candidate, task.max_claimants().as_usize())
            .await?;
        match record {
            AdmissionRecord::Existing(existing) => {
                debug!(%task_id, %claimer, claim_id = %existing.id(), "claimer already holds a claim");
                self.mark_claimed(&task).await?;
                Ok(ClaimOutcome::AlreadyClaimed(existing))
            }
            AdmissionRecord::AtCapacity { active } => {
                debug!(%task_id, %claimer, active, "claim limit reached");
                self.mark_claimed(&task).await?;
                Err(ClaimServiceError::ClaimLimitReached {
                    task_id,
                    max_claimants: task.max_claimants().value(),
                })
            }
            AdmissionRecord::Inserted {
                claim,
                prior_active,
            } => {
                self.mark_claimed(&task).await?;
                info!(
                    %task_id,
                    %claimer,
                    claim_id = %claim.id(),
                    active = prior_active + 1,
                    "claim admitted"
                );
                Ok(ClaimOutcome::Created(claim))
            }
        }
    }

    /// Moves a task holding active claims out of `Open`.
    async fn mark_claimed(&self, task: &Task) -> ClaimServiceResult<()> {
        if task.status() == TaskStatus::Open {
            self.lifecycle
                .transition_status(task.id(), TaskStatus::Claimed)
                .await?;
        }
        Ok(())
    }
}
