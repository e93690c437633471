//! Adapters for claim ports.

pub mod memory;
