//! Claim admission, completion submission and settlement.
//!
//! A claim is one claimer's commitment to do a task. Admission is bounded by
//! the task's claimant limit under a per-task lock and a capacity-conditional
//! insert. Approving a submitted claim settles it: the escrowed reward is
//! released to the claimer, their earnings and reputation are credited, and
//! the task completes. Every settlement step is idempotent, so a partially
//! applied approval is finished by approving again.
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
