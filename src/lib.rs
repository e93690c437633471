//! Taskvault: escrow-backed task brokering.
//!
//! This crate implements the lifecycle engine behind a paid-task marketplace:
//! owners post tasks with a reward held in escrow, claimants bid for them,
//! and approved work is settled by releasing the escrow to the claimant.
//!
//! # Architecture
//!
//! Taskvault follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence and collaborators
//! - **Adapters**: Concrete implementations of ports (in-memory stores)
//! - **Services**: Orchestration of domain rules across ports
//!
//! # Modules
//!
//! - [`task`]: Task creation, validation, listing, and status transitions
//! - [`claim`]: Claim admission control, completion submission, settlement
//! - [`escrow`]: Append-only escrow ledger and task custody flag
//! - [`user`]: Claimant earnings and reputation accounts
//! - [`reconcile`]: Scheduled sweep over stale and unresolved tasks
//! - [`broker`]: Caller-facing surface combining the services above

pub mod broker;
pub mod claim;
pub mod clock;
pub mod config;
pub mod error;
pub mod escrow;
pub mod keyed_lock;
pub mod reconcile;
pub mod task;
pub mod telemetry;
pub mod user;
