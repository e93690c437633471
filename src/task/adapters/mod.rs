//! Adapters for task lifecycle ports.

pub mod memory;
