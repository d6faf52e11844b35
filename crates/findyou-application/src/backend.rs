//! The set of backend ports the application talks to.

use std::sync::Arc;

use findyou_core::auth::AuthProvider;
use findyou_core::chat::ChatStore;
use findyou_core::error::Result;
use findyou_core::media::ImageStore;
use findyou_core::user::ProfileStore;
use findyou_infrastructure::{
    InMemoryAuthProvider, InMemoryChatStore, InMemoryImageStore, InMemoryProfileStore,
};

#[derive(Clone)]
pub struct Backend {
    pub profiles: Arc<dyn ProfileStore>,
    pub chats: Arc<dyn ChatStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub images: Arc<dyn ImageStore>,
}

impl Backend {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        chats: Arc<dyn ChatStore>,
        auth: Arc<dyn AuthProvider>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            profiles,
            chats,
            auth,
            images,
        }
    }
}

/// In-memory backend with typed handles kept for seeding and fault
/// injection.
#[derive(Clone)]
pub struct InMemoryBackend {
    pub profiles: InMemoryProfileStore,
    pub chats: InMemoryChatStore,
    pub auth: Arc<InMemoryAuthProvider>,
    pub images: Arc<InMemoryImageStore>,
}

impl InMemoryBackend {
    /// `capacity` bounds the change feed behind store subscriptions.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            profiles: InMemoryProfileStore::with_capacity(capacity)?,
            chats: InMemoryChatStore::new()?,
            auth: Arc::new(InMemoryAuthProvider::new()),
            images: Arc::new(InMemoryImageStore::new()),
        })
    }

    pub fn backend(&self) -> Backend {
        Backend::new(
            Arc::new(self.profiles.clone()),
            Arc::new(self.chats.clone()),
            self.auth.clone(),
            self.images.clone(),
        )
    }
}
