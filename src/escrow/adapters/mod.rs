//! Adapters for the escrow ledger port.

pub mod memory;
