//! When steps for claim settlement BDD scenarios.

use super::given::register;
use super::world::{SettlementWorld, run_async};
use chrono::Duration;
use taskvault::escrow::ports::EscrowRepository;
use rstest_bdd_macros::when;

#[when("two claimers claim the task at the same time")]
fn two_claimers_race(world: &mut SettlementWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let first = register(world)?;
    let second = register(world)?;
    let (left, right) = run_async(async {
        tokio::join!(
            world.broker.claim_task(task_id, first),
            world.broker.claim_task(task_id, second),
        )
    });
    world.claim_results = vec![left, right];
    Ok(())
}

#[when("the owner approves the claim")]
fn owner_approves(world: &mut SettlementWorld) -> Result<(), eyre::Report> {
    let claim_id = world.claim()?.id();
    let owner = world.owner()?;
    let approved = run_async(world.broker.approve_claim(claim_id, owner))?;
    world.claim = Some(approved);
    Ok(())
}

#[when("the owner rejects the claim")]
fn owner_rejects(world: &mut SettlementWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    world.ledger_before = Some(run_async(world.ledger.find_by_task(task_id))?);
    let claim_id = world.claim()?.id();
    let owner = world.owner()?;
    let rejected = run_async(world.broker.reject_claim(claim_id, owner))?;
    world.claim = Some(rejected);
    Ok(())
}

#[when("the clock passes the claim deadline")]
fn clock_passes_claim_deadline(world: &mut SettlementWorld) {
    world.clock.advance(Duration::hours(1) + Duration::seconds(1));
}

#[when("a reconciliation pass runs")]
fn reconciliation_pass_runs(world: &mut SettlementWorld) -> Result<(), eyre::Report> {
    run_async(world.broker.run_reconciliation_pass())?;
    Ok(())
}
