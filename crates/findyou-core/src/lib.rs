//! Domain layer for FindYou: user records, the candidate filter, the
//! like/dislike protocol and chat channel identity.
//!
//! Everything that talks to a backend is a trait here; adapters live in
//! `findyou-infrastructure`.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod matching;
pub mod media;
pub mod session;
pub mod user;

// Re-export common error type
pub use error::FindYouError;
pub use session::Session;
