//! Escrow custody ledger.
//!
//! Every movement of a task's reward is recorded as an append-only
//! [`domain::EscrowTransaction`]. Locking sets the task's custody flag,
//! refunding clears it, and releasing pays the claimer while leaving the flag
//! set. Each operation is bookkept in two phases (pending, then completed or
//! failed) so a failed custody change is visible in the ledger.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
