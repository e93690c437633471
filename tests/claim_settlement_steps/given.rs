//! Given steps for claim settlement BDD scenarios.

use super::world::{SettlementWorld, run_async};
use chrono::Duration;
use mockable::Clock;
use rust_decimal::Decimal;
use taskvault::task::services::CreateTaskRequest;
use taskvault::user::{
    domain::{UserAccount, UserId},
    ports::UserAccountRepository,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

/// Registers a fresh account in the world's user store.
pub fn register(world: &SettlementWorld) -> Result<UserId, eyre::Report> {
    let id = UserId::new();
    run_async(world.users.store(&UserAccount::new(id, &world.clock)))
        .wrap_err("register scenario user")?;
    Ok(id)
}

#[given("an owner has posted a task worth {reward:u32} with {slots:u32} claimant slot")]
fn owner_posted_task(
    world: &mut SettlementWorld,
    reward: u32,
    slots: u32,
) -> Result<(), eyre::Report> {
    let owner = register(world)?;
    let now = world.clock.utc();
    let request = CreateTaskRequest::new(
        "Return the library books",
        "Three books, all due today",
        Decimal::from(reward),
        now + Duration::hours(1),
        now + Duration::hours(2),
    )
    .with_max_claimants(slots);
    let task = run_async(world.broker.create_task(owner, request))
        .wrap_err("post task for settlement scenario")?;
    world.owner = Some(owner);
    world.task = Some(task);
    Ok(())
}

#[given("a claimer has claimed the task")]
fn claimer_claimed_task(world: &mut SettlementWorld) -> Result<(), eyre::Report> {
    let claimer = register(world)?;
    let task_id = world.task()?.id();
    let outcome = run_async(world.broker.claim_task(task_id, claimer))
        .wrap_err("claim task in scenario setup")?;
    world.claimer = Some(claimer);
    world.claim = Some(outcome.claim().clone());
    Ok(())
}

#[given(r#"the claimer has submitted "{text}""#)]
fn claimer_submitted(world: &mut SettlementWorld, text: String) -> Result<(), eyre::Report> {
    let claim_id = world.claim()?.id();
    let claimer = world.claimer()?;
    let submitted = run_async(world.broker.submit_completion(claim_id, claimer, text, None))
        .wrap_err("submit completion in scenario setup")?;
    world.claim = Some(submitted);
    Ok(())
}
