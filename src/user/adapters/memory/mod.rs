//! In-memory adapter implementations for testing.

mod account;

pub use account::InMemoryUserAccountRepository;
