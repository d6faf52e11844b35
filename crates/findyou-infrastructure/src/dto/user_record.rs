//! UserRecord DTOs and migrations

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use findyou_core::error::Result;
use findyou_core::user::{Gender, UserRecord};

use super::codec_error;

/// Entity name of user documents in the migrator.
pub const USER_RECORD_ENTITY: &str = "user_record";

/// User document V1.0.0 (identity and display fields only).
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct UserRecordV1_0 {
    #[serde(deserialize_with = "non_empty_id")]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// User document V1.1.0 (added gender settings and swipe lists).
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct UserRecordV1_1 {
    #[serde(deserialize_with = "non_empty_id")]
    pub user_id: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub image_url: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub bio: String,
    /// A missing key, `null` or `""` mean `ANY`.
    #[serde(default, deserialize_with = "stored_gender")]
    pub gender: Gender,
    #[serde(default, deserialize_with = "stored_gender")]
    pub gender_preference: Gender,
    #[serde(default, deserialize_with = "nullable_ids")]
    pub swipe_left: Vec<String>,
    #[serde(default, deserialize_with = "nullable_ids")]
    pub swipe_right: Vec<String>,
    #[serde(default, deserialize_with = "nullable_ids")]
    pub matches: Vec<String>,
}

/// Type alias for the latest UserRecord version.
pub type UserRecordDTO = UserRecordV1_1;

fn non_empty_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = String::deserialize(deserializer)?;
    if id.trim().is_empty() {
        return Err(de::Error::custom("userId must not be empty"));
    }
    Ok(id)
}

fn nullable_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn stored_gender<'de, D>(deserializer: D) -> std::result::Result<Gender, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Gender::Any),
        Some(raw) => raw.parse().map_err(de::Error::custom),
    }
}

fn nullable_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(de::Error::custom("relationship lists must not contain empty ids"));
    }
    Ok(ids)
}

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from UserRecordV1_0 to UserRecordV1_1.
///
/// Genders default to `ANY` and the swipe lists start empty.
impl MigratesTo<UserRecordV1_1> for UserRecordV1_0 {
    fn migrate(self) -> UserRecordV1_1 {
        UserRecordV1_1 {
            user_id: self.user_id,
            name: self.name.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            bio: self.bio.unwrap_or_default(),
            gender: Gender::Any,
            gender_preference: Gender::Any,
            swipe_left: Vec::new(),
            swipe_right: Vec::new(),
            matches: Vec::new(),
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

/// Convert UserRecordV1_1 DTO to domain model.
impl IntoDomain<UserRecord> for UserRecordV1_1 {
    fn into_domain(self) -> UserRecord {
        UserRecord {
            user_id: self.user_id,
            name: self.name,
            username: self.username,
            bio: self.bio,
            image_url: self.image_url,
            gender: self.gender,
            gender_preference: self.gender_preference,
            rejected: self.swipe_left.into_iter().collect(),
            liked: self.swipe_right.into_iter().collect(),
            matched: self.matches.into_iter().collect(),
        }
    }
}

/// Convert domain model to UserRecordV1_1 DTO for persistence.
impl FromDomain<UserRecord> for UserRecordV1_1 {
    fn from_domain(record: UserRecord) -> Self {
        UserRecordV1_1 {
            user_id: record.user_id,
            name: record.name,
            username: record.username,
            image_url: record.image_url,
            bio: record.bio,
            gender: record.gender,
            gender_preference: record.gender_preference,
            swipe_left: record.rejected.into_iter().collect(),
            swipe_right: record.liked.into_iter().collect(),
            matches: record.matched.into_iter().collect(),
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for user documents.
///
/// # Migration Path
///
/// - V1.0 → V1.1: Adds gender settings (`ANY`) and empty swipe lists
/// - V1.1 → UserRecord: Converts DTO to domain model
pub fn create_user_record_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    // Register migration path: V1.0 -> V1.1 -> UserRecord
    let user_record_path = version_migrate::Migrator::define(USER_RECORD_ENTITY)
        .from::<UserRecordV1_0>()
        .step::<UserRecordV1_1>()
        .into_with_save::<UserRecord>();

    migrator.register(user_record_path).map_err(codec_error)?;

    Ok(migrator)
}
