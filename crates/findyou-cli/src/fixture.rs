//! TOML seed files for the in-memory store.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use findyou_core::user::{Gender, ProfileStore, UserRecord};
use findyou_infrastructure::InMemoryProfileStore;

/// Separators used by `simulate --actions`.
const RESERVED: &[char] = &['+', '-', ','];

#[derive(Debug, Deserialize)]
pub struct Fixture {
    #[serde(default, rename = "user")]
    pub users: Vec<FixtureUser>,
}

/// One seeded user. The username doubles as the user id.
#[derive(Debug, Deserialize)]
pub struct FixtureUser {
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub preference: String,
    #[serde(default)]
    pub liked: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
}

impl FixtureUser {
    fn to_record(&self) -> Result<UserRecord> {
        let mut record = UserRecord::new(self.username.clone());
        record.username = self.username.clone();
        record.name = self.name.clone();
        record.bio = self.bio.clone();
        record.gender = parse_gender(&self.gender, &self.username)?;
        record.gender_preference = parse_gender(&self.preference, &self.username)?;
        record.liked = self.liked.iter().cloned().collect();
        record.rejected = self.rejected.iter().cloned().collect();
        Ok(record)
    }
}

fn parse_gender(raw: &str, username: &str) -> Result<Gender> {
    raw.parse::<Gender>()
        .with_context(|| format!("invalid gender '{}' for user '{}'", raw, username))
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid seed file {}", path.display()))
    }

    /// Usernames must not contain the separators of `simulate --actions`.
    pub fn parse(content: &str) -> Result<Self> {
        let fixture: Self = toml::from_str(content)?;
        for user in &fixture.users {
            ensure!(
                !user.username.trim().is_empty(),
                "seeded users need a username"
            );
            ensure!(
                !user.username.contains(RESERVED),
                "username '{}' must not contain any of {:?}",
                user.username,
                RESERVED
            );
        }
        Ok(fixture)
    }

    /// Writes every user into `store`.
    pub async fn seed(&self, store: &InMemoryProfileStore) -> Result<usize> {
        for user in &self.users {
            store.put_user(&user.to_record()?).await?;
        }
        tracing::info!(users = self.users.len(), "Seeded profile store");
        Ok(self.users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixture() {
        let fixture = Fixture::parse(
            r#"
[[user]]
username = "alice"
gender = "female"
preference = "MALE"
liked = ["bob"]

[[user]]
username = "bob"
"#,
        )
        .unwrap();

        assert_eq!(fixture.users.len(), 2);
        let alice = fixture.users[0].to_record().unwrap();
        assert_eq!(alice.user_id, "alice");
        assert_eq!(alice.gender, Gender::Female);
        assert!(alice.liked.contains("bob"));

        let bob = fixture.users[1].to_record().unwrap();
        assert_eq!(bob.gender, Gender::Any);
    }

    #[test]
    fn test_unknown_gender_is_rejected() {
        let fixture = Fixture::parse("[[user]]\nusername = \"x\"\ngender = \"robot\"\n").unwrap();
        assert!(fixture.users[0].to_record().is_err());
    }

    #[test]
    fn test_usernames_with_action_separators_are_rejected() {
        for name in ["mary-jane", "a+b", "x,y", " "] {
            let content = format!("[[user]]\nusername = \"{}\"\n", name);
            assert!(Fixture::parse(&content).is_err(), "accepted '{}'", name);
        }
        assert!(Fixture::parse("[[user]]\nusername = \"mary_jane\"\n").is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seed.toml");
        std::fs::write(&path, "[[user]]\nusername = \"alice\"\n").unwrap();
        assert_eq!(Fixture::load(&path).unwrap().users.len(), 1);
    }
}
