//! Error types for escrow domain validation and parsing.

use super::{EscrowTransactionId, EscrowTransactionStatus};
use thiserror::Error;

/// Errors returned by escrow domain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EscrowDomainError {
    /// The ledger entry cannot move between the given statuses.
    #[error("escrow transaction {transaction_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Ledger entry being updated.
        transaction_id: EscrowTransactionId,
        /// Current status.
        from: EscrowTransactionStatus,
        /// Requested status.
        to: EscrowTransactionStatus,
    },
}

/// Error returned while parsing transaction statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown escrow transaction status: {0}")]
pub struct ParseEscrowTransactionStatusError(pub String);

/// Error returned while parsing transaction types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown escrow transaction type: {0}")]
pub struct ParseEscrowTransactionTypeError(pub String);
