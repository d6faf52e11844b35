//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema of the documents kept in the
//! backend store. They are private to the infrastructure layer and handle
//! the evolution of the storage format over time.
//!
//! Documents are flat JSON objects carrying a `version` key next to the
//! payload fields. Field names follow the store's camelCase convention.
//!
//! ### UserRecord Version History
//! - **1.0.0**: `userId`, `name`, `username`, `imageUrl`, `bio`
//! - **1.1.0**: Added `gender`, `genderPreference`, `swipeLeft`, `swipeRight`, `matches`
//!
//! ### ChatChannel / ChatMessage Version History
//! - **1.0.0**: Initial schema

mod chat;
mod user_record;

use findyou_core::FindYouError;
use findyou_core::chat::{ChatChannel, ChatMessage};
use findyou_core::error::Result;
use findyou_core::user::UserRecord;
use serde_json::Value;
use version_migrate::Migrator;

pub use chat::{
    CHAT_CHANNEL_ENTITY, CHAT_MESSAGE_ENTITY, ChatChannelV1_0, ChatMessageV1_0, ChatUserDTO,
    create_chat_migrator,
};
pub use user_record::{
    USER_RECORD_ENTITY, UserRecordDTO, UserRecordV1_0, UserRecordV1_1,
    create_user_record_migrator,
};

fn codec_error(err: impl std::fmt::Display) -> FindYouError {
    FindYouError::Serialization {
        format: "migration".to_string(),
        message: err.to_string(),
    }
}

/// Encodes domain values into store documents and back.
///
/// Decoding migrates older document versions and rejects malformed ones.
pub struct DocumentCodec {
    users: Migrator,
    chats: Migrator,
}

impl DocumentCodec {
    pub fn new() -> Result<Self> {
        Ok(Self {
            users: create_user_record_migrator()?,
            chats: create_chat_migrator()?,
        })
    }

    pub fn encode_user(&self, record: &UserRecord) -> Result<Value> {
        let json = self
            .users
            .save_domain_flat(USER_RECORD_ENTITY, record.clone())
            .map_err(codec_error)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn decode_user(&self, document: Value) -> Result<UserRecord> {
        self.users
            .load_flat_from(USER_RECORD_ENTITY, document)
            .map_err(codec_error)
    }

    pub fn encode_channel(&self, channel: &ChatChannel) -> Result<Value> {
        let json = self
            .chats
            .save_domain_flat(CHAT_CHANNEL_ENTITY, channel.clone())
            .map_err(codec_error)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn decode_channel(&self, document: Value) -> Result<ChatChannel> {
        self.chats
            .load_flat_from(CHAT_CHANNEL_ENTITY, document)
            .map_err(codec_error)
    }

    pub fn encode_message(&self, message: &ChatMessage) -> Result<Value> {
        let json = self
            .chats
            .save_domain_flat(CHAT_MESSAGE_ENTITY, message.clone())
            .map_err(codec_error)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn decode_message(&self, document: Value) -> Result<ChatMessage> {
        self.chats
            .load_flat_from(CHAT_MESSAGE_ENTITY, document)
            .map_err(codec_error)
    }
}
