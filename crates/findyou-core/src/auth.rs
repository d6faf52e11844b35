//! Authentication provider trait and input checks.

use async_trait::async_trait;

use crate::error::{FindYouError, Result};
use crate::session::Session;

/// Message shown when a required form field is empty.
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields";

/// An abstract identity provider (email + password accounts).
///
/// Credential storage belongs to the provider; callers only ever see the
/// resulting [`Session`].
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Registers a new account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session>;

    /// Signs in to an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Ends the given session.
    async fn sign_out(&self, session: &Session) -> Result<()>;
}

/// Fails with a `Validation` error if any of `fields` is blank.
pub fn require_fields(fields: &[&str]) -> Result<()> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        Err(FindYouError::validation(MISSING_FIELDS_MESSAGE))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_fields() {
        assert!(require_fields(&["alice", "a@example.com", "secret"]).is_ok());

        let err = require_fields(&["alice", "  ", "secret"]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.user_message(), MISSING_FIELDS_MESSAGE);
    }
}
