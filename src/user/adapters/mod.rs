//! Adapters for the user account port.

pub mod memory;
