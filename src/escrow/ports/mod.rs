//! Port contracts for the escrow ledger.

pub mod repository;

pub use repository::{EscrowRepository, EscrowRepositoryError, EscrowRepositoryResult};
