//! Port contracts for claims.

pub mod chat;
pub mod repository;

pub use chat::{ChatChannelError, ChatChannelId, ChatChannelPort, ChatChannelResult};
pub use repository::{
    AdmissionRecord, ClaimRepository, ClaimRepositoryError, ClaimRepositoryResult,
};
