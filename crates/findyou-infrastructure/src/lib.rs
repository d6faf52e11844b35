pub mod config_service;
pub mod dto;
pub mod fault;
pub mod memory_auth_provider;
pub mod memory_chat_store;
pub mod memory_image_store;
pub mod memory_profile_store;

pub use crate::config_service::ConfigService;
pub use crate::dto::DocumentCodec;
pub use crate::memory_auth_provider::InMemoryAuthProvider;
pub use crate::memory_chat_store::InMemoryChatStore;
pub use crate::memory_image_store::InMemoryImageStore;
pub use crate::memory_profile_store::InMemoryProfileStore;
