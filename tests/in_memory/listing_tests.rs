//! In-memory integration tests for task creation, lookup, and listing.

use super::helpers::{Marketplace, marketplace};
use chrono::Duration;
use rstest::rstest;
use rust_decimal::Decimal;
use taskvault::error::ErrorKind;
use taskvault::task::domain::{TaskId, TaskStatus};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_task_round_trips(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let request = marketplace.request(
        Decimal::new(7_550, 2),
        3,
        Duration::hours(4),
        Duration::hours(9),
    );

    let created = marketplace.broker.create_task(owner, request).await?;
    let fetched = marketplace.broker.get_task(created.id()).await?;

    eyre::ensure!(fetched == created);
    eyre::ensure!(fetched.owner_id() == owner);
    eyre::ensure!(fetched.status() == TaskStatus::Open);
    eyre::ensure!(fetched.escrow_locked());
    eyre::ensure!(fetched.reward().value() == Decimal::new(7_550, 2));
    eyre::ensure!(fetched.max_claimants().value() == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_requests_are_validation_errors(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let requests = [
        marketplace.request(Decimal::ZERO, 1, Duration::hours(1), Duration::hours(2)),
        marketplace.request(Decimal::ONE, 0, Duration::hours(1), Duration::hours(2)),
        marketplace.request(Decimal::ONE, 1, Duration::hours(2), Duration::hours(2)),
        marketplace.request(Decimal::ONE, 1, Duration::zero(), Duration::hours(2)),
    ];

    for request in requests {
        let Err(err) = marketplace.broker.create_task(owner, request).await else {
            eyre::bail!("invalid request should be refused");
        };
        eyre::ensure!(err.kind() == ErrorKind::Validation, "unexpected error {err}");
    }
    eyre::ensure!(marketplace.broker.owner_tasks(owner, 10, 0).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_not_found(marketplace: Marketplace) {
    let result = marketplace.broker.get_task(TaskId::new()).await;

    assert!(matches!(result, Err(err) if err.kind() == ErrorKind::NotFound));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_tasks_page_newest_first(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    let mut created = Vec::new();
    for _ in 0..3 {
        let task = marketplace
            .broker
            .create_task(owner, marketplace.standard_request())
            .await?;
        created.push(task.id());
        marketplace.clock.advance(Duration::minutes(1));
    }
    created.reverse();

    let first_page: Vec<_> = marketplace
        .broker
        .open_tasks(2, 0)
        .await?
        .iter()
        .map(|task| task.id())
        .collect();
    let second_page: Vec<_> = marketplace
        .broker
        .open_tasks(2, 2)
        .await?
        .iter()
        .map(|task| task.id())
        .collect();

    eyre::ensure!(first_page == created.get(..2).unwrap_or_default());
    eyre::ensure!(second_page == created.get(2..).unwrap_or_default());
    Ok(())
}

#[rstest]
#[case::zero_limit(0, 0, 3)]
#[case::negative_limit(-4, 0, 3)]
#[case::negative_offset(2, -1, 2)]
#[case::past_the_end(5, 10, 0)]
#[tokio::test(flavor = "multi_thread")]
async fn listing_bounds_are_clamped(
    marketplace: Marketplace,
    #[case] limit: i64,
    #[case] offset: i64,
    #[case] expected: usize,
) -> eyre::Result<()> {
    let owner = marketplace.register().await?;
    for _ in 0..3 {
        marketplace
            .broker
            .create_task(owner, marketplace.standard_request())
            .await?;
    }

    let page = marketplace.broker.owner_tasks(owner, limit, offset).await?;

    eyre::ensure!(page.len() == expected, "expected {expected}, got {}", page.len());
    Ok(())
}
