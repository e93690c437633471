//! In-memory integration tests for completion, approval, and rejection.

use super::helpers::{Marketplace, marketplace};
use chrono::{Duration, Utc};
use rstest::rstest;
use rust_decimal::Decimal;
use taskvault::broker::{BrokerError, InMemoryTaskBroker};
use taskvault::claim::{
    domain::{ClaimId, ClaimStatus},
    services::ClaimServiceError,
};
use taskvault::config::EngineConfig;
use taskvault::error::ErrorKind;
use taskvault::escrow::domain::{EscrowTransactionStatus, EscrowTransactionType};
use taskvault::task::{
    domain::{Task, TaskStatus},
    services::CreateTaskRequest,
};
use taskvault::user::domain::UserId;

struct Submitted {
    owner: UserId,
    claimer: UserId,
    task: Task,
    claim_id: ClaimId,
}

async fn submitted(marketplace: &Marketplace) -> eyre::Result<Submitted> {
    let owner = marketplace.register().await?;
    let claimer = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;
    let outcome = marketplace.broker.claim_task(task.id(), claimer).await?;
    let claim_id = outcome.claim().id();
    let claim = marketplace
        .broker
        .submit_completion(claim_id, claimer, "done", None)
        .await?;
    eyre::ensure!(claim.is_submitted(), "claim should be submitted");
    Ok(Submitted {
        owner,
        claimer,
        task,
        claim_id,
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_pays_the_claimer_once(marketplace: Marketplace) -> eyre::Result<()> {
    let setup = submitted(&marketplace).await?;

    let approved = marketplace
        .broker
        .approve_claim(setup.claim_id, setup.owner)
        .await?;

    eyre::ensure!(approved.status() == ClaimStatus::Approved);
    let task = marketplace.broker.get_task(setup.task.id()).await?;
    eyre::ensure!(task.status() == TaskStatus::Completed);
    let account = marketplace.account(setup.claimer).await?;
    eyre::ensure!(account.total_earned() == Decimal::new(100, 0));
    eyre::ensure!(account.reputation() == 1);
    let releases = marketplace
        .entries(setup.task.id(), EscrowTransactionType::Release)
        .await?;
    eyre::ensure!(releases.len() == 1, "expected one release");
    let release = releases
        .first()
        .ok_or_else(|| eyre::eyre!("missing release"))?;
    eyre::ensure!(release.amount() == Decimal::new(100, 0));
    eyre::ensure!(release.status() == EscrowTransactionStatus::Completed);
    eyre::ensure!(marketplace.chat.channel_for(task.id(), setup.claimer).is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_approvals_settle_once(marketplace: Marketplace) -> eyre::Result<()> {
    let setup = submitted(&marketplace).await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let broker = marketplace.broker.clone();
        let (claim_id, owner) = (setup.claim_id, setup.owner);
        handles.push(tokio::spawn(
            async move { broker.approve_claim(claim_id, owner).await },
        ));
    }
    let mut approvals = 0_usize;
    for handle in handles {
        match handle.await? {
            Ok(_) => approvals += 1,
            Err(BrokerError::Claim(ClaimServiceError::AlreadyResolved { .. })) => {}
            Err(other) => eyre::bail!("unexpected approval error: {other}"),
        }
    }

    eyre::ensure!(approvals == 1, "expected one approval, got {approvals}");
    let account = marketplace.account(setup.claimer).await?;
    eyre::ensure!(account.total_earned() == Decimal::new(100, 0));
    eyre::ensure!(account.reputation() == 1);
    let releases = marketplace
        .entries(setup.task.id(), EscrowTransactionType::Release)
        .await?;
    eyre::ensure!(releases.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_leaves_task_and_ledger_alone(marketplace: Marketplace) -> eyre::Result<()> {
    let setup = submitted(&marketplace).await?;
    let ledger_before = marketplace
        .ledger_snapshot(setup.task.id())
        .await?;

    let rejected = marketplace
        .broker
        .reject_claim(setup.claim_id, setup.owner)
        .await?;

    eyre::ensure!(rejected.status() == ClaimStatus::Rejected);
    let task = marketplace.broker.get_task(setup.task.id()).await?;
    eyre::ensure!(task.status() == TaskStatus::Claimed);
    eyre::ensure!(task.escrow_locked());
    let ledger_after = marketplace.ledger_snapshot(setup.task.id()).await?;
    eyre::ensure!(ledger_before == ledger_after, "ledger should be unchanged");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_resolve_claims(marketplace: Marketplace) -> eyre::Result<()> {
    let setup = submitted(&marketplace).await?;
    let stranger = marketplace.register().await?;

    let approve = marketplace
        .broker
        .approve_claim(setup.claim_id, stranger)
        .await;
    let reject = marketplace
        .broker
        .reject_claim(setup.claim_id, stranger)
        .await;

    for result in [approve, reject] {
        let Err(err) = result else {
            eyre::bail!("a stranger must not resolve the claim");
        };
        eyre::ensure!(err.kind() == taskvault::error::ErrorKind::Unauthorized);
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn default_broker_settles_unregistered_claimer() -> eyre::Result<()> {
    let broker = InMemoryTaskBroker::in_memory(&EngineConfig::default());
    let (owner, claimer) = (UserId::new(), UserId::new());
    let now = Utc::now();
    let request = CreateTaskRequest::new(
        "Walk the dog",
        "Thirty minutes around the park",
        Decimal::new(100, 0),
        now + Duration::hours(1),
        now + Duration::hours(2),
    );
    let task = broker.create_task(owner, request).await?;
    let claim_id = broker.claim_task(task.id(), claimer).await?.claim().id();
    broker
        .submit_completion(claim_id, claimer, "done", None)
        .await?;

    let approved = broker.approve_claim(claim_id, owner).await?;

    eyre::ensure!(approved.status() == ClaimStatus::Approved);
    let settled = broker.get_task(task.id()).await?;
    eyre::ensure!(settled.status() == TaskStatus::Completed);
    let account = broker.get_account(claimer).await?;
    eyre::ensure!(account.total_earned() == Decimal::new(100, 0));
    eyre::ensure!(account.reputation() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn default_broker_provisions_accounts() -> eyre::Result<()> {
    let broker = InMemoryTaskBroker::in_memory(&EngineConfig::default());
    let user = UserId::new();

    let missing = broker.get_account(user).await;
    let opened = broker.get_or_create_account(user).await?;

    eyre::ensure!(matches!(missing, Err(ref err) if err.kind() == ErrorKind::NotFound));
    eyre::ensure!(opened.id() == user);
    eyre::ensure!(broker.get_account(user).await? == opened);
    Ok(())
}
