//! In-memory integration tests for deadline reconciliation.

use super::helpers::{Marketplace, marketplace};
use chrono::Duration;
use rstest::rstest;
use rust_decimal::Decimal;
use taskvault::config::{EngineConfig, OwnerDeadlinePolicy, ReconcilerConfig};
use taskvault::escrow::domain::EscrowTransactionType;
use taskvault::task::domain::TaskStatus;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unclaimed_task_is_cancelled_and_refunded(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;
    marketplace
        .clock
        .advance(Duration::hours(1) + Duration::seconds(1));

    let report = marketplace.broker.run_reconciliation_pass().await?;

    eyre::ensure!(report.cancelled == 1 && report.refunded == 1);
    let cancelled = marketplace.broker.get_task(task.id()).await?;
    eyre::ensure!(cancelled.status() == TaskStatus::Cancelled);
    let refunds = marketplace
        .entries(task.id(), EscrowTransactionType::Refund)
        .await?;
    eyre::ensure!(refunds.len() == 1, "expected one refund");
    let refund = refunds
        .first()
        .ok_or_else(|| eyre::eyre!("missing refund"))?;
    eyre::ensure!(refund.user_id() == owner);
    eyre::ensure!(refund.amount() == Decimal::new(100, 0));

    let repeat = marketplace.broker.run_reconciliation_pass().await?;
    eyre::ensure!(repeat.examined == 0);
    let refunds_after = marketplace
        .entries(task.id(), EscrowTransactionType::Refund)
        .await?;
    eyre::ensure!(refunds_after.len() == 1, "refund must not repeat");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_tasks_leave_open_listing(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;
    eyre::ensure!(marketplace.broker.open_tasks(10, 0).await?.len() == 1);
    marketplace.clock.advance(Duration::hours(1));

    eyre::ensure!(
        marketplace.broker.open_tasks(10, 0).await?.is_empty(),
        "expired tasks are not listed even before the sweep"
    );
    marketplace.broker.run_reconciliation_pass().await?;

    let owned = marketplace.broker.owner_tasks(owner, 10, 0).await?;
    eyre::ensure!(owned.iter().all(|listed| listed.id() == task.id()
        && listed.status() == TaskStatus::Cancelled));
    Ok(())
}

#[rstest]
#[case::dispute(OwnerDeadlinePolicy::Dispute, TaskStatus::Disputed)]
#[case::ignore(OwnerDeadlinePolicy::Ignore, TaskStatus::Claimed)]
#[tokio::test(flavor = "multi_thread")]
async fn owner_deadline_policy_applies_to_claimed_tasks(
    #[case] policy: OwnerDeadlinePolicy,
    #[case] expected: TaskStatus,
) -> eyre::Result<()> {
    let config = EngineConfig {
        reconciler: ReconcilerConfig {
            owner_deadline_policy: policy,
            ..ReconcilerConfig::default()
        },
        ..EngineConfig::default()
    };
    let marketplace = Marketplace::with_config(&config);
    let owner = marketplace.register().await?;
    let claimer = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;
    marketplace.broker.claim_task(task.id(), claimer).await?;
    marketplace.clock.advance(Duration::hours(2));

    marketplace.broker.run_reconciliation_pass().await?;

    let reloaded = marketplace.broker.get_task(task.id()).await?;
    eyre::ensure!(
        reloaded.status() == expected,
        "expected {expected}, found {}",
        reloaded.status()
    );
    eyre::ensure!(reloaded.escrow_locked(), "escrow stays locked");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disputed_task_can_still_be_settled(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let claimer = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;
    let claim = marketplace.broker.claim_task(task.id(), claimer).await?;
    marketplace
        .broker
        .submit_completion(claim.claim().id(), claimer, "left at reception", None)
        .await?;
    marketplace.clock.advance(Duration::hours(3));
    marketplace.broker.run_reconciliation_pass().await?;

    marketplace
        .broker
        .approve_claim(claim.claim().id(), owner)
        .await?;

    let settled = marketplace.broker.get_task(task.id()).await?;
    eyre::ensure!(settled.status() == TaskStatus::Completed);
    eyre::ensure!(marketplace.account(claimer).await?.total_earned() == Decimal::new(100, 0));
    Ok(())
}
