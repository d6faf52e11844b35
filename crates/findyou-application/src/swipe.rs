//! Swipe actions on top of the match protocol.
//!
//! Surfaces "Match!" for confirmed matches and keeps incomplete
//! confirmations around until [`SwipeService::retry_pending`] finishes them.

use std::sync::Arc;

use tokio::sync::Mutex;

use findyou_core::Session;
use findyou_core::chat::ChatChannel;
use findyou_core::error::{FindYouError, Result};
use findyou_core::matching::{LikeOutcome, MatchProtocol, PendingMatch};

use crate::notifications::NotificationCenter;

pub struct SwipeService {
    protocol: Arc<MatchProtocol>,
    notifications: NotificationCenter,
    pending: Mutex<Vec<PendingMatch>>,
}

impl SwipeService {
    pub fn new(protocol: Arc<MatchProtocol>, notifications: NotificationCenter) -> Self {
        Self {
            protocol,
            notifications,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub async fn like(&self, session: &Session, target_id: &str) -> Result<LikeOutcome> {
        match self.protocol.like(session, target_id).await {
            Ok(outcome) => {
                if outcome.is_match() {
                    self.notifications.matched();
                }
                Ok(outcome)
            }
            Err(err) => Err(self.keep_pending(err, "Cannot like user").await),
        }
    }

    pub async fn dislike(&self, session: &Session, target_id: &str) -> Result<()> {
        self.protocol
            .dislike(session, target_id)
            .await
            .map_err(|err| {
                self.notifications.report_error("Cannot dislike user", &err);
                err
            })
    }

    /// Replays the incomplete confirmations started by `session`'s user.
    ///
    /// Returns the channels of the matches that are now complete. Steps that
    /// fail again stay pending.
    pub async fn retry_pending(&self, session: &Session) -> Vec<ChatChannel> {
        let mine: Vec<PendingMatch> = {
            let mut pending = self.pending.lock().await;
            let (mine, others): (Vec<_>, Vec<_>) = pending
                .drain(..)
                .partition(|p| p.caller_id == session.user_id);
            *pending = others;
            mine
        };

        let mut confirmed = Vec::new();
        for pending in mine {
            match self.protocol.resume(pending).await {
                Ok(channel) => {
                    self.notifications.matched();
                    confirmed.push(channel);
                }
                Err(err) => {
                    self.keep_pending(err, "Match still incomplete").await;
                }
            }
        }
        confirmed
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn keep_pending(&self, err: FindYouError, context: &str) -> FindYouError {
        self.notifications.report_error(context, &err);
        if let FindYouError::PartialMutation { pending, .. } = &err {
            tracing::warn!(
                caller_id = %pending.caller_id,
                target_id = %pending.target_id,
                steps = pending.remaining.len(),
                "Keeping incomplete match for retry"
            );
            self.pending.lock().await.push(pending.as_ref().clone());
        }
        err
    }
}
