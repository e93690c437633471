//! Completion submission, approval and rejection.

use mockable::Clock;
use tracing::{info, warn};

use super::claims::{ClaimService, ClaimServiceError, ClaimServiceResult};
use crate::claim::{
    domain::{Claim, ClaimId, ClaimStatus, CompletionSubmission, CompletionText},
    ports::{ChatChannelPort, ClaimRepository},
};
use crate::escrow::{domain::EscrowTransactionType, ports::EscrowRepository};
use crate::task::{
    domain::{Task, TaskStatus},
    ports::TaskRepository,
};
use crate::user::{
    domain::{SettlementKey, UserAccount, UserId},
    ports::UserAccountRepository,
};

impl<T, E, R, U, H, C> ClaimService<T, E, R, U, H, C>
where
    T: TaskRepository,
    E: EscrowRepository,
    R: ClaimRepository,
    U: UserAccountRepository,
    H: ChatChannelPort,
    C: Clock + Send + Sync,
{
    /// Records the claimer's completion evidence on a pending claim.
    ///
    /// Afterwards a chat channel between claimer and owner is opened or
    /// reused; failing to open it is logged and does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimServiceError::ClaimNotFound`],
    /// [`ClaimServiceError::Unauthorized`] unless `user` is the claimer,
    /// [`ClaimServiceError::Domain`] for blank text, and
    /// [`ClaimServiceError::AlreadyResolved`] once the claim is no longer
    /// pending.
    pub async fn submit_completion(
        &self,
        claim_id: ClaimId,
        user: UserId,
        text: impl Into<String>,
        image_url: Option<String>,
    ) -> ClaimServiceResult<Claim> {
        let claim = self.get_claim(claim_id).await?;
        if claim.claimer_id() != user {
            return Err(ClaimServiceError::Unauthorized {
                claim_id,
                user_id: user,
            });
        }
        let completion = CompletionText::new(text)?;
        if claim.status() != ClaimStatus::Pending {
            return Err(ClaimServiceError::AlreadyResolved {
                claim_id,
                status: claim.status(),
            });
        }

        let now = self.clock.utc();
        let submission = CompletionSubmission::new(completion, image_url, now);
        let submitted = self
            .claims
            .record_submission(claim_id, submission, now)
            .await?;
        info!(%claim_id, task_id = %submitted.task_id(), "completion submitted");

        self.open_chat_channel(&submitted).await;
        Ok(submitted)
    }

    /// Approves a submitted claim and settles it.
    ///
    /// Settlement releases the escrowed reward to the claimer, credits their
    /// earnings and reputation, and completes the task. Approving a claim
    /// that is already approved but whose task has not completed finishes
    /// the interrupted settlement.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimServiceError::ClaimNotFound`],
    /// [`ClaimServiceError::Unauthorized`] unless `owner` owns the task,
    /// [`ClaimServiceError::NotSubmitted`],
    /// [`ClaimServiceError::AlreadyResolved`],
    /// [`ClaimServiceError::TaskNotSettleable`],
    /// [`ClaimServiceError::SettlementInProgress`] when another claim on the
    /// task was already approved or paid, or the error of the failed
    /// settlement step.
    pub async fn approve_claim(
        &self,
        claim_id: ClaimId,
        owner: UserId,
    ) -> ClaimServiceResult<Claim> {
        let requested = self.get_claim(claim_id).await?;
        self.authorize_owner(&requested, owner).await?;
        let _guard = self.task_locks.acquire(requested.task_id()).await;

        let claim = self.get_claim(claim_id).await?;
        let task = self.load_task(claim.task_id()).await?;
        ensure_approvable(&claim, &task)?;

        let approved = if claim.status() == ClaimStatus::Pending {
            self.ensure_sole_settlement(&claim, &task).await?;
            self.claims
                .update_status(
                    claim_id,
                    ClaimStatus::Pending,
                    ClaimStatus::Approved,
                    self.clock.utc(),
                )
                .await?
        } else {
            info!(%claim_id, task_id = %task.id(), "resuming interrupted settlement");
            claim
        };

        self.settle(&approved, &task).await?;
        Ok(approved)
    }

    /// Rejects a pending claim.
    ///
    /// The claim keeps its claimant slot; the task and ledger are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimServiceError::ClaimNotFound`],
    /// [`ClaimServiceError::Unauthorized`] unless `owner` owns the task, and
    /// [`ClaimServiceError::AlreadyResolved`] unless the claim is pending.
    pub async fn reject_claim(
        &self,
        claim_id: ClaimId,
        owner: UserId,
    ) -> ClaimServiceResult<Claim> {
        let requested = self.get_claim(claim_id).await?;
        self.authorize_owner(&requested, owner).await?;
        let _guard = self.task_locks.acquire(requested.task_id()).await;

        let claim = self.get_claim(claim_id).await?;
        if claim.status() != ClaimStatus::Pending {
            return Err(ClaimServiceError::AlreadyResolved {
                claim_id,
                status: claim.status(),
            });
        }
        let rejected = self
            .claims
            .update_status(
                claim_id,
                ClaimStatus::Pending,
                ClaimStatus::Rejected,
                self.clock.utc(),
            )
            .await?;
        info!(%claim_id, task_id = %rejected.task_id(), "claim rejected");
        Ok(rejected)
    }

    async fn authorize_owner(&self, claim: &Claim, owner: UserId) -> ClaimServiceResult<()> {
        let task = self.load_task(claim.task_id()).await?;
        if task.owner_id() != owner {
            return Err(ClaimServiceError::Unauthorized {
                claim_id: claim.id(),
                user_id: owner,
            });
        }
        Ok(())
    }

    /// Refuses to approve `claim` while another claim on the task holds or
    /// has received the task's single release.
    async fn ensure_sole_settlement(&self, claim: &Claim, task: &Task) -> ClaimServiceResult<()> {
        let other_approved = self
            .claims
            .find_by_task(task.id())
            .await?
            .iter()
            .any(|other| other.id() != claim.id() && other.status() == ClaimStatus::Approved);
        let paid_elsewhere = self
            .lifecycle
            .ledger()
            .transactions_for_task(task.id())
            .await?
            .iter()
            .any(|entry| {
                entry.is_completed(EscrowTransactionType::Release)
                    && entry.user_id() != claim.claimer_id()
            });
        if other_approved || paid_elsewhere {
            warn!(claim_id = %claim.id(), task_id = %task.id(), "another claim is being settled");
            return Err(ClaimServiceError::SettlementInProgress(task.id()));
        }
        Ok(())
    }

    /// Applies the idempotent settlement steps for an approved claim.
    async fn settle(&self, claim: &Claim, task: &Task) -> ClaimServiceResult<()> {
        let reward = task.reward().value();
        let claimer = claim.claimer_id();
        let key = SettlementKey::from(claim.id());

        let release = self
            .lifecycle
            .ledger()
            .release_escrow(task.id(), claimer, reward)
            .await?;
        self.users
            .find_or_store(&UserAccount::new(claimer, &*self.clock))
            .await?;
        self.users.credit_earnings(claimer, reward, key).await?;
        self.users
            .increment_reputation(claimer, self.reputation_per_approval, key)
            .await?;
        if task.status() != TaskStatus::Completed {
            self.lifecycle
                .transition_status(task.id(), TaskStatus::Completed)
                .await?;
        }

        info!(
            claim_id = %claim.id(),
            task_id = %task.id(),
            %claimer,
            %reward,
            release_id = %release.id(),
            "claim settled"
        );
        Ok(())
    }

    async fn open_chat_channel(&self, claim: &Claim) {
        let task = match self.load_task(claim.task_id()).await {
            Ok(task) => task,
            Err(err) => {
                warn!(claim_id = %claim.id(), error = %err, "skipping chat channel");
                return;
            }
        };
        match self
            .chat
            .open_channel(task.id(), claim.claimer_id(), task.owner_id())
            .await
        {
            Ok(channel_id) => {
                info!(claim_id = %claim.id(), %channel_id, "chat channel ready");
            }
            Err(err) => {
                warn!(claim_id = %claim.id(), error = %err, "failed to open chat channel");
            }
        }
    }
}

fn ensure_approvable(claim: &Claim, task: &Task) -> ClaimServiceResult<()> {
    if !claim.is_submitted() {
        return Err(ClaimServiceError::NotSubmitted(claim.id()));
    }
    let already_settled =
        claim.status() == ClaimStatus::Approved && task.status() == TaskStatus::Completed;
    if matches!(claim.status(), ClaimStatus::Rejected | ClaimStatus::Cancelled) || already_settled
    {
        return Err(ClaimServiceError::AlreadyResolved {
            claim_id: claim.id(),
            status: claim.status(),
        });
    }
    if !task.status().is_settleable() {
        return Err(ClaimServiceError::TaskNotSettleable {
            task_id: task.id(),
            status: task.status(),
        });
    }
    Ok(())
}
