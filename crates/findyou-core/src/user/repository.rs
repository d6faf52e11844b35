//! Profile store trait.
//!
//! Defines the interface to the hosted document database that holds one
//! record per user.

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::model::{Gender, RelationshipList, UserRecord};
use super::update::ProfileUpdate;
use crate::error::Result;

/// Live feed of one user's record. Dropping it detaches the listener.
pub type UserSubscription = BoxStream<'static, Result<UserRecord>>;

/// Live feed of full query snapshots. Dropping it detaches the listener.
pub type PopulationSubscription = BoxStream<'static, Result<Vec<UserRecord>>>;

/// An abstract store for user records.
///
/// Every call is a suspension point. List mutations are atomic set
/// operations on a single document; there is no cross-document transaction.
///
/// # Implementation Notes
///
/// Implementations should:
/// - report unreachable backends as `DataUnavailable`
/// - report missing documents as `NotFound`
/// - deliver an item on a subscription for every change of a watched
///   document, starting with the current state
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Reads one user record.
    async fn get_user(&self, user_id: &str) -> Result<UserRecord>;

    /// Looks up a user by username, used for the sign-up conflict check.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Creates or overwrites the record (last write wins).
    async fn put_user(&self, record: &UserRecord) -> Result<()>;

    /// Merges `update` into the stored record and returns the result.
    ///
    /// Only display fields are written. The relationship lists are kept as
    /// stored at the time of the write, so a concurrent list mutation is
    /// never overwritten.
    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRecord>;

    /// Watches one user record.
    async fn subscribe_user(&self, user_id: &str) -> Result<UserSubscription>;

    /// Watches every user whose stored gender is one of `genders`.
    ///
    /// Each item is the complete current result set.
    async fn query_users_by_gender(&self, genders: &[Gender]) -> Result<PopulationSubscription>;

    /// Adds `value` to a list of `user_id`'s record. Adding twice is a no-op.
    async fn add_to_list(&self, user_id: &str, list: RelationshipList, value: &str) -> Result<()>;

    /// Removes `value` from a list of `user_id`'s record. Removing an
    /// absent value is a no-op.
    async fn remove_from_list(
        &self,
        user_id: &str,
        list: RelationshipList,
        value: &str,
    ) -> Result<()>;
}
