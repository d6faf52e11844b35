//! In-memory email/password identity provider.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use findyou_core::FindYouError;
use findyou_core::auth::AuthProvider;
use findyou_core::error::Result;
use findyou_core::session::Session;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
}

#[derive(Debug, Default)]
struct AuthState {
    accounts: HashMap<String, Account>,
    active: HashSet<String>,
}

/// Accounts keyed by email, with a fresh UUID per account.
#[derive(Debug, Default)]
pub struct InMemoryAuthProvider {
    state: Mutex<AuthState>,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `user_id` currently has a signed-in session.
    pub async fn is_signed_in(&self, user_id: &str) -> bool {
        self.state.lock().await.active.contains(user_id)
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(FindYouError::auth("The email address is badly formatted")),
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FindYouError::auth(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&email) {
            return Err(FindYouError::auth(
                "The email address is already in use by another account",
            ));
        }
        let user_id = Uuid::new_v4().to_string();
        state.accounts.insert(
            email.clone(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        state.active.insert(user_id.clone());
        tracing::info!(%user_id, "Registered account");
        Ok(Session::new(user_id, email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email)?;
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get(&email)
            .filter(|account| account.password == password)
            .cloned()
            .ok_or_else(|| FindYouError::auth("Invalid email or password"))?;
        state.active.insert(account.user_id.clone());
        tracing::info!(user_id = %account.user_id, "Signed in");
        Ok(Session::new(account.user_id, email))
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.active.remove(&session.user_id) {
            tracing::debug!(user_id = %session.user_id, "Sign-out without active session");
        }
        Ok(())
    }
}
