use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use findyou_core::config::FindYouConfig;
use findyou_core::user::ProfileStore;

use super::{Demo, session_for};

const FEED_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(config: &FindYouConfig, seed: &Path, username: &str) -> Result<()> {
    let demo = Demo::load(config, seed).await?;
    let viewer = demo
        .memory
        .profiles
        .get_user(username)
        .await
        .with_context(|| format!("unknown user '{}'", username))?;

    let feed = demo.app.candidate_feed(&session_for(username));
    let state = tokio::time::timeout(FEED_TIMEOUT, feed.wait_for(|s| !s.loading))
        .await
        .context("candidate feed did not settle")?
        .context("candidate feed stopped")?;

    println!(
        "{} ({}, looking for {}): {} candidate(s)",
        viewer.display_name(),
        viewer.gender,
        viewer.gender_preference,
        state.candidates.len()
    );
    let mut candidates = state.candidates;
    candidates.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    for candidate in candidates {
        println!(
            "  {:<12} {:<7} wants {:<7} {}",
            candidate.display_name(),
            candidate.gender.as_str(),
            candidate.gender_preference.as_str(),
            candidate.bio
        );
    }
    if let Some(error) = state.error {
        println!("  (stale: {})", error);
    }

    feed.close();
    Ok(())
}
