//! Application facade wiring services to one backend and one notification
//! channel.

use std::sync::Arc;

use tokio::sync::broadcast;

use findyou_core::Session;
use findyou_core::config::FindYouConfig;
use findyou_core::matching::MatchProtocol;

use crate::account::AccountService;
use crate::backend::Backend;
use crate::chat::ChatService;
use crate::feed::CandidateFeed;
use crate::notifications::{Notification, NotificationCenter};
use crate::swipe::SwipeService;

pub struct FindYouApp {
    backend: Backend,
    notifications: NotificationCenter,
    account: AccountService,
    swipe: SwipeService,
    chat: ChatService,
}

impl FindYouApp {
    pub fn new(backend: Backend, config: &FindYouConfig) -> Self {
        let notifications = NotificationCenter::new(config.feed.channel_capacity);
        let protocol = Arc::new(MatchProtocol::new(
            backend.profiles.clone(),
            backend.chats.clone(),
            config.matching.clone(),
        ));

        Self {
            account: AccountService::new(backend.clone(), notifications.clone()),
            swipe: SwipeService::new(protocol, notifications.clone()),
            chat: ChatService::new(backend.chats.clone(), notifications.clone()),
            backend,
            notifications,
        }
    }

    pub fn account(&self) -> &AccountService {
        &self.account
    }

    pub fn swipe(&self) -> &SwipeService {
        &self.swipe
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Starts the live candidate feed for `session`.
    pub fn candidate_feed(&self, session: &Session) -> CandidateFeed {
        CandidateFeed::start(
            self.backend.profiles.clone(),
            self.notifications.clone(),
            session.clone(),
        )
    }
}
