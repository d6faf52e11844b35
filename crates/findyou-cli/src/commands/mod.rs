pub mod candidates;
pub mod simulate;

use std::path::Path;

use anyhow::Result;

use findyou_application::{FindYouApp, InMemoryBackend};
use findyou_core::Session;
use findyou_core::config::FindYouConfig;

use crate::fixture::Fixture;

/// An app on a freshly seeded in-memory backend.
pub struct Demo {
    pub memory: InMemoryBackend,
    pub app: FindYouApp,
}

impl Demo {
    pub async fn load(config: &FindYouConfig, seed: &Path) -> Result<Self> {
        let memory = InMemoryBackend::new(config.feed.channel_capacity)?;
        Fixture::load(seed)?.seed(&memory.profiles).await?;
        let app = FindYouApp::new(memory.backend(), config);
        Ok(Self { memory, app })
    }
}

/// Seeded users sign in as themselves; the username is the user id.
pub fn session_for(username: &str) -> Session {
    Session::new(username, format!("{}@findyou.local", username))
}
