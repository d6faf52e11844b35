//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: User record, gender and relationship lists
//! - `update`: Partial profile edits
//! - `repository`: Profile store trait

mod model;
mod repository;
mod update;

// Re-export public API
pub use model::{Gender, Relationship, RelationshipList, UserRecord};
pub use repository::{PopulationSubscription, ProfileStore, UserSubscription};
pub use update::ProfileUpdate;
