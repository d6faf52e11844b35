//! Like/dislike protocol.
//!
//! Per ordered pair (caller, target) the states are
//! `Unseen -> Rejected` or `Unseen -> Liked -> Matched`. A like turns into a
//! match when the target already liked the caller. Confirming a match writes
//! to two independent documents and the chat store, so it runs as a set of
//! idempotent steps that can be replayed after a partial failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::chat::{ChatChannel, ChatStore};
use crate::config::MatchSettings;
use crate::error::{FindYouError, Result, StepFailure};
use crate::session::Session;
use crate::user::{ProfileStore, RelationshipList, UserRecord};

/// One write of a match confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStep {
    /// Remove the caller from the target's `liked`.
    ConsumeTargetLike,
    /// Add the target to the caller's `matched` (and drop it from `liked`).
    AddTargetToCallerMatched,
    /// Add the caller to the target's `matched`.
    AddCallerToTargetMatched,
    /// Create the shared chat channel if it does not exist yet.
    CreateChannel,
}

impl MatchStep {
    pub const ALL: [MatchStep; 4] = [
        MatchStep::ConsumeTargetLike,
        MatchStep::AddTargetToCallerMatched,
        MatchStep::AddCallerToTargetMatched,
        MatchStep::CreateChannel,
    ];
}

/// A match confirmation that still has steps left to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMatch {
    pub caller_id: String,
    pub target_id: String,
    pub channel: ChatChannel,
    pub remaining: Vec<MatchStep>,
}

impl PendingMatch {
    /// A confirmation with every step still to do.
    pub fn new(caller: &UserRecord, target: &UserRecord, now: DateTime<Utc>) -> Self {
        Self {
            caller_id: caller.user_id.clone(),
            target_id: target.user_id.clone(),
            channel: ChatChannel::for_match(caller, target, now),
            remaining: MatchStep::ALL.to_vec(),
        }
    }

    /// The user whose data `step` writes to.
    pub fn subject_of(&self, step: MatchStep) -> &str {
        match step {
            MatchStep::ConsumeTargetLike | MatchStep::AddCallerToTargetMatched => &self.target_id,
            MatchStep::AddTargetToCallerMatched | MatchStep::CreateChannel => &self.caller_id,
        }
    }
}

/// Result of a like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    /// One-sided like recorded; no channel.
    Liked,
    /// The like was reciprocal and the match is fully confirmed.
    Matched(ChatChannel),
    /// The pair was already matched; nothing was written.
    AlreadyMatched,
}

impl LikeOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, LikeOutcome::Matched(_))
    }
}

/// Applies likes and dislikes against the profile and chat stores.
pub struct MatchProtocol {
    profiles: Arc<dyn ProfileStore>,
    chats: Arc<dyn ChatStore>,
    settings: MatchSettings,
}

impl MatchProtocol {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        chats: Arc<dyn ChatStore>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            profiles,
            chats,
            settings,
        }
    }

    /// Records a left swipe. Repeating it has no further effect and the
    /// target's record is never touched.
    ///
    /// A confirmed match is terminal, so disliking a matched user is a no-op.
    pub async fn dislike(&self, session: &Session, target_id: &str) -> Result<()> {
        ensure_not_self(session, target_id)?;
        let caller_id = session.user_id.as_str();

        let caller = self.profiles.get_user(caller_id).await?;
        if caller.matched.contains(target_id) {
            tracing::debug!(caller_id, target_id, "Already matched, ignoring dislike");
            return Ok(());
        }

        self.with_retry(|| {
            self.profiles
                .add_to_list(caller_id, RelationshipList::Rejected, target_id)
        })
        .await
        .map_err(|e| FindYouError::mutation_failed(caller_id, &e))?;
        self.with_retry(|| {
            self.profiles
                .remove_from_list(caller_id, RelationshipList::Liked, target_id)
        })
        .await
        .map_err(|e| FindYouError::mutation_failed(caller_id, &e))?;

        tracing::debug!(caller_id, target_id, "Recorded dislike");
        Ok(())
    }

    /// Records a right swipe, confirming a match if the target already liked
    /// the caller.
    ///
    /// Both records are read fresh from the store before deciding.
    ///
    /// # Errors
    ///
    /// - `Validation` when liking oneself
    /// - `NotFound` / `DataUnavailable` when a record cannot be read
    /// - `MutationFailed` when the one-sided like cannot be written
    /// - `PartialMutation` when some confirmation steps failed; replay the
    ///   carried [`PendingMatch`] with [`MatchProtocol::resume`]
    pub async fn like(&self, session: &Session, target_id: &str) -> Result<LikeOutcome> {
        ensure_not_self(session, target_id)?;
        let caller = self.profiles.get_user(&session.user_id).await?;
        let target = self.profiles.get_user(target_id).await?;

        if caller.matched.contains(target_id) {
            tracing::debug!(caller_id = %caller.user_id, target_id, "Already matched");
            return Ok(LikeOutcome::AlreadyMatched);
        }

        if !target.liked.contains(&caller.user_id) {
            self.record_one_sided_like(&caller, target_id).await?;
            return Ok(LikeOutcome::Liked);
        }

        tracing::info!(
            caller_id = %caller.user_id,
            target_id,
            "Reciprocal like, confirming match"
        );
        let pending = PendingMatch::new(&caller, &target, Utc::now());
        let channel = self.confirm(pending).await?;
        Ok(LikeOutcome::Matched(channel))
    }

    /// Replays the steps a previous confirmation could not apply.
    pub async fn resume(&self, pending: PendingMatch) -> Result<ChatChannel> {
        tracing::info!(
            caller_id = %pending.caller_id,
            target_id = %pending.target_id,
            steps = pending.remaining.len(),
            "Resuming match confirmation"
        );
        self.confirm(pending).await
    }

    async fn record_one_sided_like(&self, caller: &UserRecord, target_id: &str) -> Result<()> {
        let caller_id = caller.user_id.as_str();
        self.with_retry(|| {
            self.profiles
                .add_to_list(caller_id, RelationshipList::Liked, target_id)
        })
        .await
        .map_err(|e| FindYouError::mutation_failed(caller_id, &e))?;

        if caller.rejected.contains(target_id) {
            self.with_retry(|| {
                self.profiles
                    .remove_from_list(caller_id, RelationshipList::Rejected, target_id)
            })
            .await
            .map_err(|e| FindYouError::mutation_failed(caller_id, &e))?;
        }

        tracing::debug!(caller_id, target_id, "Recorded one-sided like");
        Ok(())
    }

    /// Issues every remaining step concurrently; completion order is not
    /// relied upon.
    async fn confirm(&self, pending: PendingMatch) -> Result<ChatChannel> {
        let results = {
            let pending = &pending;
            join_all(pending.remaining.iter().map(|&step| async move {
                let result = self.with_retry(|| self.run_step(step, pending)).await;
                (step, result)
            }))
            .await
        };

        let mut completed = Vec::new();
        let mut failures = Vec::new();
        for (step, result) in results {
            match result {
                Ok(()) => completed.push(step),
                Err(err) => failures.push(StepFailure {
                    step,
                    user_id: pending.subject_of(step).to_string(),
                    cause: err.failure_cause(),
                    message: err.to_string(),
                }),
            }
        }

        if failures.is_empty() {
            tracing::info!(channel_id = %pending.channel.channel_id, "Match confirmed");
            return Ok(pending.channel);
        }

        tracing::warn!(
            channel_id = %pending.channel.channel_id,
            failed = failures.len(),
            "Match confirmation incomplete"
        );
        let remaining = failures.iter().map(|failure| failure.step).collect();
        Err(FindYouError::PartialMutation {
            completed,
            failures,
            pending: Box::new(PendingMatch {
                remaining,
                ..pending
            }),
        })
    }

    async fn run_step(&self, step: MatchStep, pending: &PendingMatch) -> Result<()> {
        let caller_id = pending.caller_id.as_str();
        let target_id = pending.target_id.as_str();
        match step {
            MatchStep::ConsumeTargetLike => {
                self.profiles
                    .remove_from_list(target_id, RelationshipList::Liked, caller_id)
                    .await
            }
            MatchStep::AddTargetToCallerMatched => {
                self.profiles
                    .add_to_list(caller_id, RelationshipList::Matched, target_id)
                    .await?;
                self.profiles
                    .remove_from_list(caller_id, RelationshipList::Liked, target_id)
                    .await?;
                // An earlier dislike must not survive the match.
                self.profiles
                    .remove_from_list(caller_id, RelationshipList::Rejected, target_id)
                    .await
            }
            MatchStep::AddCallerToTargetMatched => {
                self.profiles
                    .add_to_list(target_id, RelationshipList::Matched, caller_id)
                    .await
            }
            MatchStep::CreateChannel => {
                let created = self.chats.create_channel(&pending.channel).await?;
                if !created {
                    tracing::debug!(
                        channel_id = %pending.channel.channel_id,
                        "Channel already existed, keeping it"
                    );
                }
                Ok(())
            }
        }
    }

    async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && err.is_retryable() => {
                    tracing::debug!(attempt, error = %err, "Retrying store call");
                    let delay = self.settings.retry_backoff_ms * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn ensure_not_self(session: &Session, target_id: &str) -> Result<()> {
    if session.user_id == target_id {
        Err(FindYouError::validation("You cannot swipe on yourself"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_match_starts_with_all_steps() {
        let pending = PendingMatch::new(
            &UserRecord::new("bob"),
            &UserRecord::new("alice"),
            Utc::now(),
        );
        assert_eq!(pending.remaining, MatchStep::ALL.to_vec());
        assert_eq!(pending.subject_of(MatchStep::ConsumeTargetLike), "alice");
        assert_eq!(pending.subject_of(MatchStep::AddTargetToCallerMatched), "bob");
        assert_eq!(pending.subject_of(MatchStep::AddCallerToTargetMatched), "alice");
    }

    #[test]
    fn test_swiping_on_self_is_rejected() {
        let session = Session::new("alice", "alice@example.com");
        assert!(ensure_not_self(&session, "alice").unwrap_err().is_validation());
        assert!(ensure_not_self(&session, "bob").is_ok());
    }
}
