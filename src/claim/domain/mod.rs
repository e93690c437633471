//! Domain model for claims.

mod claim;
mod error;
mod ids;
mod submission;

pub use claim::{Claim, ClaimStatus};
pub use error::{ClaimDomainError, ParseClaimStatusError};
pub use ids::ClaimId;
pub use submission::{CompletionSubmission, CompletionText};
