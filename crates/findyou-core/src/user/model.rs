//! UserRecord domain model.
//!
//! One record per registered user: display attributes, gender settings and
//! the three relationship lists driven by swiping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::FindYouError;

/// Gender of a profile, or the gender a profile wants to see.
///
/// `Any` means "unspecified" when used as a gender and "show me everyone"
/// when used as a preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Any,
}

impl Gender {
    /// All values, in display order.
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Any];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Any => "ANY",
        }
    }

    /// Returns true if a profile of `gender` satisfies this preference.
    pub fn accepts(self, gender: Gender) -> bool {
        self == Gender::Any || self == gender
    }

    /// Stored gender values a query for this preference has to cover.
    pub fn acceptable_genders(self) -> Vec<Gender> {
        match self {
            Gender::Any => Gender::ALL.to_vec(),
            specific => vec![specific],
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses stored gender strings.
///
/// Matching is case-insensitive and an empty string means `Any`. Anything
/// else is rejected rather than defaulted.
impl FromStr for Gender {
    type Err = FindYouError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ANY" => Ok(Gender::Any),
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            other => Err(FindYouError::validation(format!(
                "unknown gender value '{}'",
                other
            ))),
        }
    }
}

/// The three swipe-driven lists on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipList {
    /// Swiped left.
    Rejected,
    /// Swiped right, not yet reciprocated.
    Liked,
    /// Mutual like confirmed.
    Matched,
}

impl RelationshipList {
    /// Field name of the list in the stored user document.
    pub fn field_name(&self) -> &'static str {
        match self {
            RelationshipList::Rejected => "swipeLeft",
            RelationshipList::Liked => "swipeRight",
            RelationshipList::Matched => "matches",
        }
    }
}

impl fmt::Display for RelationshipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// How one user currently stands towards another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Unseen,
    Rejected,
    Liked,
    Matched,
}

/// User record domain model.
///
/// Empty strings stand for absent display attributes. The relationship
/// lists are sets of counterpart user ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque id assigned at registration.
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub gender_preference: Gender,
    #[serde(default)]
    pub rejected: BTreeSet<String>,
    #[serde(default)]
    pub liked: BTreeSet<String>,
    #[serde(default)]
    pub matched: BTreeSet<String>,
}

impl UserRecord {
    /// Creates an empty record for a freshly registered user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: String::new(),
            username: String::new(),
            bio: String::new(),
            image_url: String::new(),
            gender: Gender::Any,
            gender_preference: Gender::Any,
            rejected: BTreeSet::new(),
            liked: BTreeSet::new(),
            matched: BTreeSet::new(),
        }
    }

    pub fn list(&self, list: RelationshipList) -> &BTreeSet<String> {
        match list {
            RelationshipList::Rejected => &self.rejected,
            RelationshipList::Liked => &self.liked,
            RelationshipList::Matched => &self.matched,
        }
    }

    pub fn list_mut(&mut self, list: RelationshipList) -> &mut BTreeSet<String> {
        match list {
            RelationshipList::Rejected => &mut self.rejected,
            RelationshipList::Liked => &mut self.liked,
            RelationshipList::Matched => &mut self.matched,
        }
    }

    /// Where `other_id` sits in this user's lists.
    ///
    /// `Matched` wins over the other lists if a stale entry is still around.
    pub fn relationship_with(&self, other_id: &str) -> Relationship {
        if self.matched.contains(other_id) {
            Relationship::Matched
        } else if self.liked.contains(other_id) {
            Relationship::Liked
        } else if self.rejected.contains(other_id) {
            Relationship::Rejected
        } else {
            Relationship::Unseen
        }
    }

    /// Returns true if this user already swiped on or matched `other_id`.
    pub fn has_interacted_with(&self, other_id: &str) -> bool {
        self.relationship_with(other_id) != Relationship::Unseen
    }

    /// Name shown to other users: the username, or the real name if no
    /// username is set.
    pub fn display_name(&self) -> &str {
        if self.username.trim().is_empty() {
            &self.name
        } else {
            &self.username
        }
    }
}
