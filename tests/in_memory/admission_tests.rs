//! In-memory integration tests for claim admission.

use std::sync::Arc;

use super::helpers::{Marketplace, marketplace};
use chrono::Duration;
use rstest::rstest;
use rust_decimal::Decimal;
use taskvault::broker::BrokerError;
use taskvault::claim::{
    domain::ClaimStatus,
    services::{ClaimOutcome, ClaimServiceError},
};
use taskvault::error::ErrorKind;
use taskvault::task::domain::TaskStatus;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_claimers_on_single_slot_task(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;
    let first = marketplace.register().await?;
    let second = marketplace.register().await?;

    let broker = Arc::new(marketplace.broker.clone());
    let first_broker = Arc::clone(&broker);
    let second_broker = Arc::clone(&broker);
    let task_id = task.id();
    let (left, right) = tokio::join!(
        tokio::spawn(async move { first_broker.claim_task(task_id, first).await }),
        tokio::spawn(async move { second_broker.claim_task(task_id, second).await }),
    );
    let outcomes = [left?, right?];

    let created: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Ok(ClaimOutcome::Created(claim)) => Some(claim),
            _ => None,
        })
        .collect();
    let refused = outcomes
        .iter()
        .filter(|outcome| {
            matches!(
                outcome,
                Err(BrokerError::Claim(ClaimServiceError::ClaimLimitReached { .. }))
            )
        })
        .count();
    eyre::ensure!(created.len() == 1, "exactly one claim should be created");
    eyre::ensure!(refused == 1, "the other claimer should hit the limit");
    let claim = created
        .first()
        .ok_or_else(|| eyre::eyre!("missing created claim"))?;
    eyre::ensure!(claim.status() == ClaimStatus::Pending);
    let reloaded = marketplace.broker.get_task(task_id).await?;
    eyre::ensure!(reloaded.status() == TaskStatus::Claimed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn many_claimers_never_exceed_capacity(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let request = marketplace.request(
        Decimal::new(50, 0),
        4,
        Duration::hours(1),
        Duration::hours(2),
    );
    let task = marketplace.broker.create_task(owner, request).await?;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let broker = marketplace.broker.clone();
        let claimer = marketplace.register().await?;
        let task_id = task.id();
        handles.push(tokio::spawn(
            async move { broker.claim_task(task_id, claimer).await },
        ));
    }
    let mut created = 0_usize;
    for handle in handles {
        if matches!(handle.await?, Ok(ClaimOutcome::Created(_))) {
            created += 1;
        }
    }

    let claims = marketplace.broker.claims_for_task(task.id()).await?;
    eyre::ensure!(created == 4, "expected 4 admissions, got {created}");
    eyre::ensure!(claims.len() == 4, "expected 4 stored claims, got {}", claims.len());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reclaiming_is_idempotent(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let claimer = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;

    let first = marketplace.broker.claim_task(task.id(), claimer).await?;
    let again = marketplace.broker.claim_task(task.id(), claimer).await?;

    eyre::ensure!(first.is_created());
    eyre::ensure!(again == ClaimOutcome::AlreadyClaimed(first.claim().clone()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claim_errors_keep_their_kind(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let task = marketplace
        .broker
        .create_task(owner, marketplace.standard_request())
        .await?;
    marketplace.clock.advance(Duration::hours(1));

    let late = marketplace
        .broker
        .claim_task(task.id(), marketplace.register().await?)
        .await;

    let Err(err) = late else {
        eyre::bail!("claim after the deadline should fail");
    };
    eyre::ensure!(err.kind() == ErrorKind::StateConflict);
    eyre::ensure!(err.kind().is_client_error());
    Ok(())
}
