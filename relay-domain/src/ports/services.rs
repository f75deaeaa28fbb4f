use async_trait::async_trait;

use crate::entities::{MessageRef, OutgoingMessage, PlayerProfile};

#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    async fn send_message(&self, channel_id: &str, message: &OutgoingMessage) -> anyhow::Result<MessageRef>;
    async fn edit_message(&self, target: &MessageRef, message: &OutgoingMessage) -> anyhow::Result<()>;
    /// `Ok(None)` when the platform reports the message does not exist.
    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> anyhow::Result<Option<MessageRef>>;
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Absent on not-found, on missing credentials and on lookup failure.
    async fn player_profile(&self, steam_id: &str) -> Option<PlayerProfile>;
}
