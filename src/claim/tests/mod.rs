//! Unit tests for the claim module.
