//! In-memory implementation of [`ChatStore`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock, broadcast};

use findyou_core::FindYouError;
use findyou_core::chat::{ChatChannel, ChatMessage, ChatStore, MessageSubscription};
use findyou_core::error::{FailureCause, Result};

use crate::dto::DocumentCodec;
use crate::fault::FaultPlan;

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Key under which failures of channel creation are planned.
const CREATE_KEY: &str = "chat:create";

#[derive(Default)]
struct ChatDocuments {
    channels: HashMap<String, Value>,
    messages: HashMap<String, Vec<Value>>,
}

struct Inner {
    documents: RwLock<ChatDocuments>,
    codec: DocumentCodec,
    events: broadcast::Sender<String>,
    faults: Mutex<FaultPlan>,
}

impl Inner {
    async fn load_messages(&self, channel_id: &str) -> Result<Vec<ChatMessage>> {
        let documents = self.documents.read().await;
        let stored = documents
            .messages
            .get(channel_id)
            .ok_or_else(|| FindYouError::not_found("chat channel", channel_id))?;
        stored
            .iter()
            .map(|document| self.codec.decode_message(document.clone()))
            .collect()
    }
}

/// Process-local stand-in for the hosted chat database.
#[derive(Clone)]
pub struct InMemoryChatStore {
    inner: Arc<Inner>,
}

impl InMemoryChatStore {
    pub fn new() -> Result<Self> {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(Inner {
                documents: RwLock::new(ChatDocuments::default()),
                codec: DocumentCodec::new()?,
                events,
                faults: Mutex::new(FaultPlan::default()),
            }),
        })
    }

    /// Makes the next `times` channel creations fail with `cause`.
    pub async fn fail_next_creates(&self, times: u32, cause: FailureCause) {
        self.inner.faults.lock().await.fail_next(CREATE_KEY, times, cause);
    }

    /// Number of stored channels.
    pub async fn channel_count(&self) -> usize {
        self.inner.documents.read().await.channels.len()
    }

    /// Returns the raw stored channel document.
    pub async fn channel_document(&self, channel_id: &str) -> Option<Value> {
        self.inner
            .documents
            .read()
            .await
            .channels
            .get(channel_id)
            .cloned()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create_channel(&self, channel: &ChatChannel) -> Result<bool> {
        self.inner.faults.lock().await.check(CREATE_KEY)?;
        let document = self.inner.codec.encode_channel(channel)?;

        let mut documents = self.inner.documents.write().await;
        if documents.channels.contains_key(&channel.channel_id) {
            return Ok(false);
        }
        documents
            .channels
            .insert(channel.channel_id.clone(), document);
        documents
            .messages
            .insert(channel.channel_id.clone(), Vec::new());
        tracing::info!(channel_id = %channel.channel_id, "Created chat channel");
        Ok(true)
    }

    async fn get_channel(&self, channel_id: &str) -> Result<ChatChannel> {
        let document = self
            .inner
            .documents
            .read()
            .await
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| FindYouError::not_found("chat channel", channel_id))?;
        self.inner.codec.decode_channel(document)
    }

    async fn channels_for_user(&self, user_id: &str) -> Result<Vec<ChatChannel>> {
        let documents = self.inner.documents.read().await;
        let mut channels = Vec::new();
        for document in documents.channels.values() {
            let channel = self.inner.codec.decode_channel(document.clone())?;
            if channel.involves(user_id) {
                channels.push(channel);
            }
        }
        channels.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.channel_id.cmp(&b.channel_id))
        });
        Ok(channels)
    }

    async fn send_message(&self, channel_id: &str, message: &ChatMessage) -> Result<()> {
        self.inner.faults.lock().await.check(channel_id)?;
        let document = self.inner.codec.encode_message(message)?;
        {
            let mut documents = self.inner.documents.write().await;
            let messages = documents
                .messages
                .get_mut(channel_id)
                .ok_or_else(|| FindYouError::not_found("chat channel", channel_id))?;
            messages.push(document);
        }
        tracing::debug!(channel_id, sent_by = %message.sent_by, "Stored chat message");
        let _ = self.inner.events.send(channel_id.to_string());
        Ok(())
    }

    async fn subscribe_messages(&self, channel_id: &str) -> Result<MessageSubscription> {
        let receiver = self.inner.events.subscribe();
        let initial = self.inner.load_messages(channel_id).await?;

        let state = (self.inner.clone(), receiver, channel_id.to_string());
        let updates = stream::unfold(state, |(inner, mut receiver, channel_id)| async move {
            loop {
                match receiver.recv().await {
                    Ok(id) if id != channel_id => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%channel_id, skipped, "Message subscription lagged, reloading");
                    }
                    Err(RecvError::Closed) => return None,
                }
                let item = inner.load_messages(&channel_id).await;
                return Some((item, (inner, receiver, channel_id)));
            }
        });

        Ok(stream::once(async move { Ok(initial) })
            .chain(updates)
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use findyou_core::user::UserRecord;

    fn channel(a: &str, b: &str, second: u32) -> ChatChannel {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, second).unwrap();
        ChatChannel::for_match(&UserRecord::new(a), &UserRecord::new(b), at)
    }

    #[tokio::test]
    async fn test_create_channel_is_create_if_absent() {
        let store = InMemoryChatStore::new().unwrap();
        let first = channel("bob", "alice", 0);
        let second = channel("alice", "bob", 5);
        assert_eq!(first.channel_id, second.channel_id);

        assert!(store.create_channel(&first).await.unwrap());
        assert!(!store.create_channel(&second).await.unwrap());
        assert_eq!(store.channel_count().await, 1);

        let kept = store.get_channel(&first.channel_id).await.unwrap();
        assert_eq!(kept.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_channels_for_user_oldest_first() {
        let store = InMemoryChatStore::new().unwrap();
        store.create_channel(&channel("alice", "carol", 9)).await.unwrap();
        store.create_channel(&channel("alice", "bob", 1)).await.unwrap();
        store.create_channel(&channel("bob", "carol", 3)).await.unwrap();

        let channels = store.channels_for_user("alice").await.unwrap();
        let counterparts: Vec<_> = channels
            .iter()
            .filter_map(|c| c.counterpart_of("alice"))
            .map(|p| p.user_id.as_str())
            .collect();
        assert_eq!(counterparts, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_messages_are_streamed_in_order() {
        let store = InMemoryChatStore::new().unwrap();
        let ch = channel("alice", "bob", 0);
        store.create_channel(&ch).await.unwrap();

        let mut messages = store.subscribe_messages(&ch.channel_id).await.unwrap();
        assert!(messages.next().await.unwrap().unwrap().is_empty());

        store
            .send_message(&ch.channel_id, &ChatMessage::new("alice", "hi"))
            .await
            .unwrap();
        let update = messages.next().await.unwrap().unwrap();
        assert_eq!(update.len(), 1);
        assert_eq!(update[0].message, "hi");
    }

    #[tokio::test]
    async fn test_send_to_missing_channel_is_not_found() {
        let store = InMemoryChatStore::new().unwrap();
        let err = store
            .send_message("nope", &ChatMessage::new("alice", "hi"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_injected_create_failure() {
        let store = InMemoryChatStore::new().unwrap();
        store.fail_next_creates(1, FailureCause::Network).await;

        let ch = channel("alice", "bob", 0);
        assert!(store.create_channel(&ch).await.unwrap_err().is_retryable());
        assert!(store.create_channel(&ch).await.unwrap());
    }
}
