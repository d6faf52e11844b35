//! Chat store trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::model::{ChatChannel, ChatMessage};
use crate::error::Result;

/// Live feed of a channel's full message list, oldest first.
pub type MessageSubscription = BoxStream<'static, Result<Vec<ChatMessage>>>;

/// An abstract store for chat channels and their messages.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Creates the channel unless one with the same id already exists.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the channel was created by this call
    /// - `Ok(false)`: a channel with this id already existed and was kept
    async fn create_channel(&self, channel: &ChatChannel) -> Result<bool>;

    /// Reads one channel.
    async fn get_channel(&self, channel_id: &str) -> Result<ChatChannel>;

    /// Lists the channels `user_id` participates in, oldest first.
    async fn channels_for_user(&self, user_id: &str) -> Result<Vec<ChatChannel>>;

    /// Appends a message to a channel.
    async fn send_message(&self, channel_id: &str, message: &ChatMessage) -> Result<()>;

    /// Watches the messages of one channel.
    async fn subscribe_messages(&self, channel_id: &str) -> Result<MessageSubscription>;
}
