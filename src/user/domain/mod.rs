//! Domain model for user accounts.

mod account;
mod ids;

pub use account::UserAccount;
pub use ids::{SettlementKey, UserId};
