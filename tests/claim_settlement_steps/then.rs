//! Then steps for claim settlement BDD scenarios.

use super::world::{SettlementWorld, run_async};
use rust_decimal::Decimal;
use taskvault::broker::BrokerError;
use taskvault::claim::{
    domain::ClaimStatus,
    services::{ClaimOutcome, ClaimServiceError},
};
use taskvault::escrow::{
    domain::{EscrowTransactionStatus, EscrowTransactionType},
    ports::EscrowRepository,
};
use taskvault::task::domain::TaskStatus;
use taskvault::user::ports::UserAccountRepository;
use rstest_bdd_macros::then;

#[then("exactly one claim is pending")]
fn exactly_one_claim_pending(world: &SettlementWorld) -> Result<(), eyre::Report> {
    let pending = world
        .claim_results
        .iter()
        .filter(|result| {
            matches!(result, Ok(ClaimOutcome::Created(claim)) if claim.status() == ClaimStatus::Pending)
        })
        .count();
    eyre::ensure!(pending == 1, "expected one pending claim, found {pending}");
    Ok(())
}

#[then("the other claimer is told the claim limit was reached")]
fn other_claimer_refused(world: &SettlementWorld) -> Result<(), eyre::Report> {
    let refused = world
        .claim_results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(BrokerError::Claim(ClaimServiceError::ClaimLimitReached { .. }))
            )
        })
        .count();
    eyre::ensure!(refused == 1, "expected one refusal, found {refused}");
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &SettlementWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = run_async(world.broker.get_task(world.task()?.id()))?;
    eyre::ensure!(
        task.status() == expected,
        "expected task status {expected}, found {}",
        task.status()
    );
    Ok(())
}

#[then(r#"the claim status is "{status}""#)]
fn claim_status_is(world: &SettlementWorld, status: String) -> Result<(), eyre::Report> {
    let expected = ClaimStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let claim = run_async(world.broker.get_claim(world.claim()?.id()))?;
    eyre::ensure!(
        claim.status() == expected,
        "expected claim status {expected}, found {}",
        claim.status()
    );
    Ok(())
}

#[then("the claimer has earned {amount:u32} with reputation {reputation:i64}")]
fn claimer_earned(
    world: &SettlementWorld,
    amount: u32,
    reputation: i64,
) -> Result<(), eyre::Report> {
    let account = run_async(world.users.find_by_id(world.claimer()?))?
        .ok_or_else(|| eyre::eyre!("missing claimer account"))?;
    eyre::ensure!(account.total_earned() == Decimal::from(amount));
    eyre::ensure!(account.reputation() == reputation);
    Ok(())
}

#[then(r#"exactly {count:usize} "{kind}" transaction of {amount:u32} exists"#)]
fn ledger_has_transactions(
    world: &SettlementWorld,
    count: usize,
    kind: String,
    amount: u32,
) -> Result<(), eyre::Report> {
    let transaction_type = EscrowTransactionType::try_from(kind.as_str())
        .map_err(|err| eyre::eyre!("invalid transaction type in scenario: {err}"))?;
    let entries: Vec<_> = run_async(world.ledger.find_by_task(world.task()?.id()))?
        .into_iter()
        .filter(|entry| entry.transaction_type() == transaction_type)
        .collect();
    eyre::ensure!(
        entries.len() == count,
        "expected {count} {kind} entries, found {}",
        entries.len()
    );
    eyre::ensure!(entries.iter().all(|entry| {
        entry.amount() == Decimal::from(amount)
            && entry.status() == EscrowTransactionStatus::Completed
    }));
    Ok(())
}

#[then("the escrow ledger is unchanged")]
fn ledger_unchanged(world: &SettlementWorld) -> Result<(), eyre::Report> {
    let before = world
        .ledger_before
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing ledger snapshot"))?;
    let after = run_async(world.ledger.find_by_task(world.task()?.id()))?;
    eyre::ensure!(before == &after, "escrow ledger changed");
    let task = run_async(world.broker.get_task(world.task()?.id()))?;
    eyre::ensure!(task.escrow_locked(), "escrow should remain locked");
    Ok(())
}
