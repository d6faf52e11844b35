//! In-memory profile image storage.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use findyou_core::FindYouError;
use findyou_core::error::Result;
use findyou_core::media::ImageStore;

const URL_PREFIX: &str = "memory://images/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    images: RwLock<HashMap<String, StoredImage>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an image by the URL `upload` returned.
    pub async fn fetch(&self, url: &str) -> Option<StoredImage> {
        let id = url.strip_prefix(URL_PREFIX)?;
        self.images.read().await.get(id).cloned()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(FindYouError::validation("Image is empty"));
        }
        if !content_type.starts_with("image/") {
            return Err(FindYouError::validation(format!(
                "Unsupported image type '{}'",
                content_type
            )));
        }

        let id = Uuid::new_v4().to_string();
        let size = bytes.len();
        self.images.write().await.insert(
            id.clone(),
            StoredImage {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        tracing::debug!(%id, size, content_type, "Stored profile image");
        Ok(format!("{}{}", URL_PREFIX, id))
    }
}
