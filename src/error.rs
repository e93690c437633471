//! Cross-context error classification.
//!
//! Each service error maps onto one [`ErrorKind`] so transport layers can
//! choose a client-facing or server-facing outcome without matching on every
//! variant of every context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification shared by all service errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A task, claim, or user does not exist.
    NotFound,
    /// Create or submit input is malformed.
    Validation,
    /// The operation is not allowed in the current lifecycle state.
    StateConflict,
    /// The caller is not the task owner or the claim's claimer.
    Unauthorized,
    /// Storage or infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::StateConflict => "state_conflict",
            Self::Unauthorized => "unauthorized",
            Self::Internal => "internal",
        }
    }

    /// Returns `true` when the error was caused by the caller's request
    /// rather than by infrastructure.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        match self {
            Self::NotFound | Self::Validation | Self::StateConflict | Self::Unauthorized => true,
            Self::Internal => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
