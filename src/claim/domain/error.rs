//! Error types for claim domain validation and parsing.

use super::{ClaimId, ClaimStatus};
use crate::error::ErrorKind;
use thiserror::Error;

/// Errors returned by claim domain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClaimDomainError {
    /// The completion text is empty after trimming.
    #[error("completion text must not be empty")]
    EmptyCompletionText,

    /// The status change is not allowed.
    #[error("claim {claim_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Claim being updated.
        claim_id: ClaimId,
        /// Current status.
        from: ClaimStatus,
        /// Requested status.
        to: ClaimStatus,
    },

    /// The claim no longer accepts submissions.
    #[error("claim {claim_id} is {status} and no longer accepts submissions")]
    NotPending {
        /// Claim being updated.
        claim_id: ClaimId,
        /// Current status.
        status: ClaimStatus,
    },
}

impl ClaimDomainError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCompletionText => ErrorKind::Validation,
            Self::InvalidStatusTransition { .. } | Self::NotPending { .. } => {
                ErrorKind::StateConflict
            }
        }
    }
}

/// Error returned while parsing claim statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown claim status: {0}")]
pub struct ParseClaimStatusError(pub String);
