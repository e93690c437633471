//! Domain model for the escrow ledger.

mod error;
mod ids;
mod transaction;

pub use error::{
    EscrowDomainError, ParseEscrowTransactionStatusError, ParseEscrowTransactionTypeError,
};
pub use ids::EscrowTransactionId;
pub use transaction::{EscrowTransaction, EscrowTransactionStatus, EscrowTransactionType};
