//! Application services for claim admission and settlement.

mod admission;
mod claims;
mod settlement;

pub use claims::{ClaimOutcome, ClaimService, ClaimServiceError, ClaimServiceResult};
