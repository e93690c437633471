//! Application services for user accounts.

mod accounts;

pub use accounts::{UserAccountError, UserAccountResult, UserAccountService};
