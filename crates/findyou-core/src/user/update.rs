//! Partial profile edits.

use serde::{Deserialize, Serialize};

use super::model::{Gender, UserRecord};

/// A profile edit where `None` keeps the current value.
///
/// Relationship lists are not part of an edit; they only change through
/// swiping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub gender: Option<Gender>,
    pub gender_preference: Option<Gender>,
}

impl ProfileUpdate {
    /// An edit that only replaces the profile image.
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns `current` with every set field replaced.
    pub fn apply_to(&self, current: &UserRecord) -> UserRecord {
        let mut next = current.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(username) = &self.username {
            next.username = username.clone();
        }
        if let Some(bio) = &self.bio {
            next.bio = bio.clone();
        }
        if let Some(image_url) = &self.image_url {
            next.image_url = image_url.clone();
        }
        if let Some(gender) = self.gender {
            next.gender = gender;
        }
        if let Some(preference) = self.gender_preference {
            next.gender_preference = preference;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut current = UserRecord::new("u1");
        current.name = "Alice".to_string();
        current.bio = "hi".to_string();
        current.liked.insert("b".to_string());

        let update = ProfileUpdate {
            bio: Some("hello there".to_string()),
            gender: Some(Gender::Female),
            ..ProfileUpdate::default()
        };
        let next = update.apply_to(&current);

        assert_eq!(next.name, "Alice");
        assert_eq!(next.bio, "hello there");
        assert_eq!(next.gender, Gender::Female);
        assert_eq!(next.gender_preference, Gender::Any);
        assert!(next.liked.contains("b"));
    }

    #[test]
    fn test_empty_update() {
        assert!(ProfileUpdate::default().is_empty());
        assert!(!ProfileUpdate::image("memory://images/1").is_empty());
    }
}
