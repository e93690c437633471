//! Application services for escrow custody.

mod ledger;

pub use ledger::{LedgerError, LedgerResult, LedgerService};
