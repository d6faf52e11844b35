//! Signed-in user session.

use serde::{Deserialize, Serialize};

use crate::error::{FindYouError, Result};

/// The signed-in user, passed explicitly into every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Id of the signed-in user's record.
    pub user_id: String,
    /// Email the user signed in with.
    pub email: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    /// Fails with `Auth` unless `user_id` is the signed-in user.
    pub fn ensure_owner(&self, user_id: &str) -> Result<()> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(FindYouError::auth(format!(
                "session of '{}' cannot act for '{}'",
                self.user_id, user_id
            )))
        }
    }
}
