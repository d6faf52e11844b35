//! Chat channel and message DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use findyou_core::chat::{ChatChannel, ChatMessage, ChatParticipant};
use findyou_core::error::Result;

use super::codec_error;

/// Entity name of chat channel documents in the migrator.
pub const CHAT_CHANNEL_ENTITY: &str = "chat_channel";

/// Entity name of chat message documents in the migrator.
pub const CHAT_MESSAGE_ENTITY: &str = "chat_message";

/// Participant snapshot as stored inside a channel document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUserDTO {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
}

impl From<ChatUserDTO> for ChatParticipant {
    fn from(dto: ChatUserDTO) -> Self {
        ChatParticipant {
            user_id: dto.user_id,
            display_name: dto.name,
            image_url: dto.image_url,
        }
    }
}

impl From<ChatParticipant> for ChatUserDTO {
    fn from(participant: ChatParticipant) -> Self {
        ChatUserDTO {
            user_id: participant.user_id,
            name: participant.display_name,
            image_url: participant.image_url,
        }
    }
}

/// V1.0.0: Initial chat channel schema.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct ChatChannelV1_0 {
    pub chat_id: String,
    pub user1: ChatUserDTO,
    pub user2: ChatUserDTO,
    pub created_at: DateTime<Utc>,
}

/// V1.0.0: Initial chat message schema.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageV1_0 {
    pub send_by: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl IntoDomain<ChatChannel> for ChatChannelV1_0 {
    fn into_domain(self) -> ChatChannel {
        ChatChannel {
            channel_id: self.chat_id,
            participant_a: self.user1.into(),
            participant_b: self.user2.into(),
            created_at: self.created_at,
        }
    }
}

impl FromDomain<ChatChannel> for ChatChannelV1_0 {
    fn from_domain(channel: ChatChannel) -> Self {
        ChatChannelV1_0 {
            chat_id: channel.channel_id,
            user1: channel.participant_a.into(),
            user2: channel.participant_b.into(),
            created_at: channel.created_at,
        }
    }
}

impl IntoDomain<ChatMessage> for ChatMessageV1_0 {
    fn into_domain(self) -> ChatMessage {
        ChatMessage {
            sent_by: self.send_by,
            message: self.message,
            timestamp: self.timestamp,
        }
    }
}

impl FromDomain<ChatMessage> for ChatMessageV1_0 {
    fn from_domain(message: ChatMessage) -> Self {
        ChatMessageV1_0 {
            send_by: message.sent_by,
            message: message.message,
            timestamp: message.timestamp,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates a Migrator covering both chat entities.
pub fn create_chat_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    let channel_path = version_migrate::Migrator::define(CHAT_CHANNEL_ENTITY)
        .from::<ChatChannelV1_0>()
        .into_with_save::<ChatChannel>();
    migrator.register(channel_path).map_err(codec_error)?;

    let message_path = version_migrate::Migrator::define(CHAT_MESSAGE_ENTITY)
        .from::<ChatMessageV1_0>()
        .into_with_save::<ChatMessage>();
    migrator.register(message_path).map_err(codec_error)?;

    Ok(migrator)
}
