//! In-memory integration tests for caller deadlines on broker operations.

use std::time::Duration;

use super::helpers::{Marketplace, marketplace};
use rstest::rstest;
use taskvault::broker::{BrokerError, within};
use taskvault::error::ErrorKind;
use taskvault::task::domain::TaskStatus;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fast_operation_finishes_within_deadline(marketplace: Marketplace) -> eyre::Result<()> {
    let owner = marketplace.register().await?;

    let task = within(
        Duration::from_secs(5),
        marketplace
            .broker
            .create_task(owner, marketplace.standard_request()),
    )
    .await?;

    eyre::ensure!(task.status() == TaskStatus::Open);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_operation_reports_elapsed_deadline() {
    let deadline = Duration::from_millis(20);

    let result = within(deadline, async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<(), BrokerError>(())
    })
    .await;

    let err = result.expect_err("operation should time out");
    assert!(matches!(err, BrokerError::DeadlineElapsed(elapsed) if elapsed == deadline));
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(!err.kind().is_client_error());
}
