//! Task lifecycle for the escrow-backed task broker.
//!
//! A task is created by its owner with a reward that is immediately locked
//! in escrow, becomes claimable until its claim deadline, and ends either
//! `Completed` (an approved claim was settled) or `Cancelled` (nobody
//! claimed it in time, or the escrow lock failed). The module follows
//! hexagonal architecture:
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
