//! Chat list and per-match chat.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use findyou_core::Session;
use findyou_core::chat::{ChatChannel, ChatMessage, ChatParticipant, ChatStore};
use findyou_core::error::{FindYouError, Result};

use crate::notifications::NotificationCenter;
use crate::state::ChatSummary;

pub struct ChatService {
    chats: Arc<dyn ChatStore>,
    notifications: NotificationCenter,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatStore>, notifications: NotificationCenter) -> Self {
        Self {
            chats,
            notifications,
        }
    }

    /// The signed-in user's chats, oldest match first.
    pub async fn list_chats(&self, session: &Session) -> Result<Vec<ChatSummary>> {
        let channels = self
            .chats
            .channels_for_user(&session.user_id)
            .await
            .map_err(|err| self.surface("Cannot load chats", err))?;
        Ok(channels
            .iter()
            .filter_map(|channel| ChatSummary::for_viewer(channel, &session.user_id))
            .collect())
    }

    /// Opens a chat and starts following its messages.
    pub async fn open_chat(&self, session: &Session, channel_id: &str) -> Result<OpenChat> {
        self.try_open(session, channel_id)
            .await
            .map_err(|err| self.surface("Cannot open chat", err))
    }

    /// Sends a reply. Blank replies are ignored and return `false`.
    pub async fn send_reply(&self, session: &Session, channel_id: &str, text: &str) -> Result<bool> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        self.try_send(session, channel_id, text)
            .await
            .map_err(|err| self.surface("Cannot send message", err))?;
        Ok(true)
    }

    async fn try_send(&self, session: &Session, channel_id: &str, text: &str) -> Result<()> {
        let channel = self.chats.get_channel(channel_id).await?;
        if !channel.involves(&session.user_id) {
            return Err(not_a_participant(session, channel_id));
        }
        let message = ChatMessage::new(session.user_id.clone(), text);
        self.chats.send_message(channel_id, &message).await
    }

    async fn try_open(&self, session: &Session, channel_id: &str) -> Result<OpenChat> {
        let channel = self.chats.get_channel(channel_id).await?;
        let counterpart = channel
            .counterpart_of(&session.user_id)
            .cloned()
            .ok_or_else(|| not_a_participant(session, channel_id))?;

        let mut subscription = self.chats.subscribe_messages(channel_id).await?;
        let (sender, messages) = watch::channel(Vec::new());
        let notifications = self.notifications.clone();
        let id = channel.channel_id.clone();
        let task = tokio::spawn(async move {
            while let Some(item) = subscription.next().await {
                match item {
                    Ok(list) => {
                        sender.send_replace(list);
                    }
                    Err(err) => {
                        notifications.report_error("Cannot load messages", &err);
                    }
                }
            }
            tracing::debug!(channel_id = %id, "Message subscription ended");
        });

        tracing::debug!(channel_id, user_id = %session.user_id, "Opened chat");
        Ok(OpenChat {
            channel,
            counterpart,
            messages,
            task,
        })
    }

    fn surface(&self, context: &str, err: FindYouError) -> FindYouError {
        self.notifications.report_error(context, &err);
        err
    }
}

/// A chat being viewed. Dropping or closing it detaches the message
/// subscription.
pub struct OpenChat {
    channel: ChatChannel,
    counterpart: ChatParticipant,
    messages: watch::Receiver<Vec<ChatMessage>>,
    task: JoinHandle<()>,
}

impl OpenChat {
    pub fn channel(&self) -> &ChatChannel {
        &self.channel
    }

    pub fn counterpart(&self) -> &ChatParticipant {
        &self.counterpart
    }

    /// Current message list, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.messages.clone()
    }

    /// Waits until at least `count` messages are visible.
    pub async fn wait_for_messages(&self, count: usize) -> Option<Vec<ChatMessage>> {
        let mut messages = self.messages.clone();
        match messages.wait_for(|list| list.len() >= count).await {
            Ok(list) => Some(list.clone()),
            Err(_) => None,
        }
    }

    pub fn close(self) {}
}

impl Drop for OpenChat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn not_a_participant(session: &Session, channel_id: &str) -> FindYouError {
    FindYouError::auth(format!(
        "'{}' is not a participant of chat '{}'",
        session.user_id, channel_id
    ))
}
