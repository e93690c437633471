//! In-memory chat channel registry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::claim::ports::{ChatChannelError, ChatChannelId, ChatChannelPort, ChatChannelResult};
use crate::task::domain::TaskId;
use crate::user::domain::UserId;

/// Records one channel per `(task, claimer)` pair.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatChannels {
    channels: Arc<RwLock<HashMap<(TaskId, UserId), ChatChannelId>>>,
}

impl InMemoryChatChannels {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the channel opened for `(task, claimer)`, if any.
    #[must_use]
    pub fn channel_for(&self, task_id: TaskId, claimer: UserId) -> Option<ChatChannelId> {
        self.channels
            .read()
            .ok()
            .and_then(|channels| channels.get(&(task_id, claimer)).copied())
    }
}

#[async_trait]
impl ChatChannelPort for InMemoryChatChannels {
    async fn open_channel(
        &self,
        task_id: TaskId,
        claimer: UserId,
        _owner: UserId,
    ) -> ChatChannelResult<ChatChannelId> {
        let mut channels = self.channels.write().map_err(|err| {
            ChatChannelError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(*channels
            .entry((task_id, claimer))
            .or_insert_with(ChatChannelId::new))
    }
}
