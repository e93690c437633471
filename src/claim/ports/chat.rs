//! Chat channel port used after a completion is submitted.

use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for chat channel operations.
pub type ChatChannelResult<T> = Result<T, ChatChannelError>;

/// Identifier of a chat channel between a claimer and a task owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatChannelId(Uuid);

impl ChatChannelId {
    /// Creates a new random channel identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ChatChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChatChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messaging collaborator.
#[async_trait]
pub trait ChatChannelPort: Send + Sync {
    /// Returns the channel for `(task, claimer)`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ChatChannelError::Unavailable`] when the messaging backend
    /// cannot be reached.
    async fn open_channel(
        &self,
        task_id: TaskId,
        claimer: UserId,
        owner: UserId,
    ) -> ChatChannelResult<ChatChannelId>;
}

/// Errors returned by chat channel implementations.
#[derive(Debug, Clone, Error)]
pub enum ChatChannelError {
    /// The messaging backend failed.
    #[error("chat backend unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChatChannelError {
    /// Wraps a backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
