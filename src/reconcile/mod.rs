//! Scheduled sweep over stale and unresolved tasks.
//!
//! [`Reconciler::run_pass`] performs one sweep: open tasks that outlived
//! their claim deadline without claims are refunded and cancelled, and
//! claimed tasks that outlived their owner deadline are handled according to
//! [`OwnerDeadlinePolicy`](crate::config::OwnerDeadlinePolicy).
//! [`spawn_reconciler`] drives passes on a fixed interval until cancelled.

mod reconciler;
mod scheduler;

pub use reconciler::{ReconcileError, ReconcileResult, ReconciliationReport, Reconciler};
pub use scheduler::spawn_reconciler;

#[cfg(test)]
mod tests;
