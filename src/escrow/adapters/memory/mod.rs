//! In-memory adapter implementations for testing.

mod ledger;

pub use ledger::InMemoryEscrowRepository;
