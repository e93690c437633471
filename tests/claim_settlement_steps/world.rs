//! Shared world state for claim settlement BDD scenarios.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rstest::fixture;
use taskvault::broker::{BrokerResult, BrokerStores, TaskBroker};
use taskvault::claim::{
    adapters::memory::{InMemoryChatChannels, InMemoryClaimRepository},
    domain::Claim,
    services::ClaimOutcome,
};
use taskvault::clock::ManualClock;
use taskvault::config::EngineConfig;
use taskvault::escrow::{adapters::memory::InMemoryEscrowRepository, domain::EscrowTransaction};
use taskvault::task::{adapters::memory::InMemoryTaskRepository, domain::Task};
use taskvault::user::{adapters::memory::InMemoryUserAccountRepository, domain::UserId};

/// Broker type used by the BDD world.
pub type TestBroker = TaskBroker<
    InMemoryTaskRepository,
    InMemoryEscrowRepository,
    InMemoryClaimRepository,
    InMemoryUserAccountRepository,
    InMemoryChatChannels,
    ManualClock,
>;

/// Scenario world for claim settlement behaviour tests.
pub struct SettlementWorld {
    pub broker: TestBroker,
    pub ledger: Arc<InMemoryEscrowRepository>,
    pub users: Arc<InMemoryUserAccountRepository>,
    pub clock: ManualClock,
    pub owner: Option<UserId>,
    pub claimer: Option<UserId>,
    pub task: Option<Task>,
    pub claim: Option<Claim>,
    pub claim_results: Vec<BrokerResult<ClaimOutcome>>,
    pub ledger_before: Option<Vec<EscrowTransaction>>,
}

impl SettlementWorld {
    /// Creates a world over empty in-memory stores and a frozen clock.
    #[must_use]
    pub fn new() -> Self {
        let clock = ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        );
        let ledger = Arc::new(InMemoryEscrowRepository::new());
        let users = Arc::new(InMemoryUserAccountRepository::new());
        let stores = BrokerStores {
            tasks: Arc::new(InMemoryTaskRepository::new()),
            ledger: Arc::clone(&ledger),
            claims: Arc::new(InMemoryClaimRepository::new()),
            users: Arc::clone(&users),
            chat: Arc::new(InMemoryChatChannels::new()),
        };
        let broker = TaskBroker::new(stores, Arc::new(clock.clone()), &EngineConfig::default());
        Self {
            broker,
            ledger,
            users,
            clock,
            owner: None,
            claimer: None,
            task: None,
            claim: None,
            claim_results: Vec::new(),
            ledger_before: None,
        }
    }

    /// Returns the task posted in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been posted yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing posted task in scenario world"))
    }

    /// Returns the claim tracked by the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no claim has been made yet.
    pub fn claim(&self) -> Result<&Claim, eyre::Report> {
        self.claim
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing claim in scenario world"))
    }

    /// Returns the task owner.
    ///
    /// # Errors
    ///
    /// Returns an error when no owner has been registered yet.
    pub fn owner(&self) -> Result<UserId, eyre::Report> {
        self.owner
            .ok_or_else(|| eyre::eyre!("missing owner in scenario world"))
    }

    /// Returns the claimer.
    ///
    /// # Errors
    ///
    /// Returns an error when no claimer has been registered yet.
    pub fn claimer(&self) -> Result<UserId, eyre::Report> {
        self.claimer
            .ok_or_else(|| eyre::eyre!("missing claimer in scenario world"))
    }
}

impl Default for SettlementWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SettlementWorld {
    SettlementWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
