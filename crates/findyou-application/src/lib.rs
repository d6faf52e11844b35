//! View-model layer for FindYou.
//!
//! Services here take an explicit [`findyou_core::Session`], publish their
//! state through `tokio::sync::watch` and report every failure on one
//! notification channel.

pub mod account;
pub mod app;
pub mod backend;
pub mod chat;
pub mod feed;
pub mod notifications;
pub mod state;
pub mod swipe;

pub use account::AccountService;
pub use app::FindYouApp;
pub use backend::{Backend, InMemoryBackend};
pub use chat::{ChatService, OpenChat};
pub use feed::CandidateFeed;
pub use notifications::{Notification, NotificationCenter, NotificationKind};
pub use state::{AccountState, CandidateState, ChatSummary};
pub use swipe::SwipeService;
