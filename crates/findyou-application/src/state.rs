//! Observable view state published through `tokio::sync::watch`.

use chrono::{DateTime, Utc};

use findyou_core::Session;
use findyou_core::chat::{ChatChannel, ChatParticipant};
use findyou_core::user::UserRecord;

/// Who is signed in and whether an account operation is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountState {
    pub session: Option<Session>,
    pub user: Option<UserRecord>,
    pub in_progress: bool,
}

impl AccountState {
    pub fn signed_in(&self) -> bool {
        self.session.is_some()
    }
}

/// The live swipe queue of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateState {
    pub candidates: Vec<UserRecord>,
    /// True until the first candidate set has been computed.
    pub loading: bool,
    /// Last data-source failure, cleared by the next successful update.
    pub error: Option<String>,
}

impl Default for CandidateState {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl CandidateState {
    pub fn contains(&self, user_id: &str) -> bool {
        self.candidates.iter().any(|c| c.user_id == user_id)
    }
}

/// One row of the chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub channel_id: String,
    /// The other participant, as snapshotted when the match happened.
    pub counterpart: ChatParticipant,
    pub created_at: DateTime<Utc>,
}

impl ChatSummary {
    /// Builds the row for `viewer`; `None` if `viewer` is not a participant.
    pub fn for_viewer(channel: &ChatChannel, viewer: &str) -> Option<Self> {
        let counterpart = channel.counterpart_of(viewer)?.clone();
        Some(Self {
            channel_id: channel.channel_id.clone(),
            counterpart,
            created_at: channel.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_summary_picks_the_other_side() {
        let channel =
            ChatChannel::for_match(&UserRecord::new("bob"), &UserRecord::new("alice"), Utc::now());

        let summary = ChatSummary::for_viewer(&channel, "alice").unwrap();
        assert_eq!(summary.counterpart.user_id, "bob");
        assert!(ChatSummary::for_viewer(&channel, "carol").is_none());
    }

    #[test]
    fn test_default_states() {
        assert!(!AccountState::default().signed_in());
        assert!(CandidateState::default().loading);
    }
}
