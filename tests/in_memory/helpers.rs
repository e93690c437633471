//! Shared test helpers for in-memory broker integration tests.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use rust_decimal::Decimal;
use taskvault::broker::{BrokerStores, TaskBroker};
use taskvault::claim::adapters::memory::{InMemoryChatChannels, InMemoryClaimRepository};
use taskvault::clock::ManualClock;
use taskvault::config::EngineConfig;
use taskvault::escrow::{
    adapters::memory::InMemoryEscrowRepository,
    domain::{EscrowTransaction, EscrowTransactionType},
    ports::EscrowRepository,
};
use taskvault::task::{
    adapters::memory::InMemoryTaskRepository, domain::TaskId, services::CreateTaskRequest,
};
use taskvault::user::{
    adapters::memory::InMemoryUserAccountRepository,
    domain::{UserAccount, UserId},
    ports::UserAccountRepository,
};

/// Broker type used by the integration tests.
pub type TestBroker = TaskBroker<
    InMemoryTaskRepository,
    InMemoryEscrowRepository,
    InMemoryClaimRepository,
    InMemoryUserAccountRepository,
    InMemoryChatChannels,
    ManualClock,
>;

/// Broker plus handles onto the stores and clock behind it.
pub struct Marketplace {
    /// Broker under test.
    pub broker: TestBroker,
    /// Escrow ledger shared with the broker.
    pub ledger: Arc<InMemoryEscrowRepository>,
    /// Account store shared with the broker.
    pub users: Arc<InMemoryUserAccountRepository>,
    /// Chat registry shared with the broker.
    pub chat: Arc<InMemoryChatChannels>,
    /// Clock shared with the broker.
    pub clock: ManualClock,
}

impl Marketplace {
    /// Creates a marketplace with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the fixed start instant is invalid.
    #[must_use]
    pub fn with_config(config: &EngineConfig) -> Self {
        let clock = ManualClock::new(
            Utc.with_ymd_and_hms(2026, 9, 14, 8, 30, 0)
                .single()
                .expect("valid instant"),
        );
        let ledger = Arc::new(InMemoryEscrowRepository::new());
        let users = Arc::new(InMemoryUserAccountRepository::new());
        let chat = Arc::new(InMemoryChatChannels::new());
        let stores = BrokerStores {
            tasks: Arc::new(InMemoryTaskRepository::new()),
            ledger: Arc::clone(&ledger),
            claims: Arc::new(InMemoryClaimRepository::new()),
            users: Arc::clone(&users),
            chat: Arc::clone(&chat),
        };
        let broker = TaskBroker::new(stores, Arc::new(clock.clone()), config);
        Self {
            broker,
            ledger,
            users,
            chat,
            clock,
        }
    }

    /// Registers a new user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be stored.
    pub async fn register(&self) -> eyre::Result<UserId> {
        let id = UserId::new();
        self.users.store(&UserAccount::new(id, &self.clock)).await?;
        Ok(id)
    }

    /// Looks up a registered account.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the account is missing.
    pub async fn account(&self, id: UserId) -> eyre::Result<UserAccount> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| eyre::eyre!("account {id} should exist"))
    }

    /// Returns the ledger entries of one type recorded for a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn entries(
        &self,
        task_id: TaskId,
        transaction_type: EscrowTransactionType,
    ) -> eyre::Result<Vec<EscrowTransaction>> {
        Ok(self
            .ledger
            .find_by_task(task_id)
            .await?
            .into_iter()
            .filter(|entry| entry.transaction_type() == transaction_type)
            .collect())
    }

    /// Returns every ledger entry recorded for a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn ledger_snapshot(&self, task_id: TaskId) -> eyre::Result<Vec<EscrowTransaction>> {
        Ok(self.ledger.find_by_task(task_id).await?)
    }

    /// Builds a creation request with deadlines relative to the clock.
    #[must_use]
    pub fn request(
        &self,
        reward: Decimal,
        max_claimants: u32,
        claim_window: Duration,
        owner_window: Duration,
    ) -> CreateTaskRequest {
        let now = self.clock.utc();
        CreateTaskRequest::new(
            "Collect the parcel",
            "Pick-up point closes at six",
            reward,
            now + claim_window,
            now + owner_window,
        )
        .with_max_claimants(max_claimants)
    }

    /// Request for a single-claimant task worth 100 with one and two hour
    /// deadlines.
    #[must_use]
    pub fn standard_request(&self) -> CreateTaskRequest {
        self.request(Decimal::new(100, 0), 1, Duration::hours(1), Duration::hours(2))
    }
}

/// Provides a marketplace with default configuration.
#[fixture]
pub fn marketplace() -> Marketplace {
    Marketplace::with_config(&EngineConfig::default())
}
