//! Image storage trait.

use async_trait::async_trait;

use crate::error::Result;

/// An abstract file store for profile images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores an image and returns the URL it can be downloaded from.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}
