//! Chat domain module.
//!
//! A confirmed match produces exactly one channel whose id is derived from
//! the two participants. Message transport is left to the [`ChatStore`].

mod model;
mod repository;

pub use model::{ChatChannel, ChatMessage, ChatParticipant, channel_id_for};
pub use repository::{ChatStore, MessageSubscription};
