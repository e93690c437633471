//! In-memory adapter implementations for testing.

mod chat;
mod claims;

pub use chat::InMemoryChatChannels;
pub use claims::InMemoryClaimRepository;
