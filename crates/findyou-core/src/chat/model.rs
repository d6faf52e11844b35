//! Chat channel and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserRecord;

/// Derives the channel id shared by two matched users.
///
/// The id is a UUID v5 over the sorted pair, so both sides of a match
/// compute the same value no matter who confirmed it.
pub fn channel_id_for(user_a: &str, user_b: &str) -> String {
    let (low, high) = if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };
    let key = format!("{}:{}", low, high);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

/// Identity of one participant as it was when the match happened.
///
/// Later profile edits are not copied into existing channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatParticipant {
    pub user_id: String,
    pub display_name: String,
    pub image_url: String,
}

impl ChatParticipant {
    pub fn snapshot_of(user: &UserRecord) -> Self {
        Self {
            user_id: user.user_id.clone(),
            display_name: user.display_name().to_string(),
            image_url: user.image_url.clone(),
        }
    }
}

/// A chat channel created once per confirmed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChannel {
    pub channel_id: String,
    pub participant_a: ChatParticipant,
    pub participant_b: ChatParticipant,
    pub created_at: DateTime<Utc>,
}

impl ChatChannel {
    /// Builds the channel for a match between `confirming` (the user whose
    /// like completed the match) and `counterpart`.
    pub fn for_match(confirming: &UserRecord, counterpart: &UserRecord, now: DateTime<Utc>) -> Self {
        Self {
            channel_id: channel_id_for(&confirming.user_id, &counterpart.user_id),
            participant_a: ChatParticipant::snapshot_of(confirming),
            participant_b: ChatParticipant::snapshot_of(counterpart),
            created_at: now,
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.participant_a.user_id == user_id || self.participant_b.user_id == user_id
    }

    /// The participant on the other side from `user_id`.
    pub fn counterpart_of(&self, user_id: &str) -> Option<&ChatParticipant> {
        if self.participant_a.user_id == user_id {
            Some(&self.participant_b)
        } else if self.participant_b.user_id == user_id {
            Some(&self.participant_a)
        } else {
            None
        }
    }
}

/// One message in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sent_by: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sent_by: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sent_by: sent_by.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
