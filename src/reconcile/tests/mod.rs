//! Unit tests for the reconcile module.
