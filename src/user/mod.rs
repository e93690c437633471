//! Claimant accounts consumed by settlement.
//!
//! Accounts are opened on first use, either explicitly through
//! [`services::UserAccountService`] or by the settlement that first pays the
//! user. Earnings and reputation adjustments carry a
//! [`domain::SettlementKey`] so a resumed settlement never applies twice.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Application services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
