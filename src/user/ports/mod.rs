//! Port contracts for user accounts.

pub mod repository;

pub use repository::{UserAccountRepository, UserRepositoryError, UserRepositoryResult};
