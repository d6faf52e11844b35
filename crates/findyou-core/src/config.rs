//! Application configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every field has a
//! default so a missing file or section is valid.

use serde::{Deserialize, Serialize};

use crate::error::{FindYouError, Result};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FindYouConfig {
    pub matching: MatchSettings,
    pub feed: FeedSettings,
    pub logging: LoggingSettings,
}

impl FindYouConfig {
    pub fn validate(&self) -> Result<()> {
        if self.matching.max_attempts == 0 {
            return Err(FindYouError::config("matching.max_attempts must be at least 1"));
        }
        if self.feed.channel_capacity == 0 {
            return Err(FindYouError::config("feed.channel_capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Retry policy for match confirmation steps.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MatchSettings {
    /// Attempts per step, including the first one.
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 50,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FeedSettings {
    /// Capacity of the change-notification channel behind store subscriptions.
    pub channel_capacity: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: FindYouConfig = toml::from_str(
            r#"
[matching]
max_attempts = 5
"#,
        )
        .unwrap();

        assert_eq!(config.matching.max_attempts, 5);
        assert_eq!(config.matching.retry_backoff_ms, 50);
        assert_eq!(config.feed.channel_capacity, 64);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = FindYouConfig::default();
        assert!(config.validate().is_ok());

        config.matching.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
