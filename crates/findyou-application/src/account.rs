//! Sign-up, login, logout and profile editing.

use std::future::Future;

use tokio::sync::watch;

use findyou_core::Session;
use findyou_core::auth::require_fields;
use findyou_core::error::{FindYouError, Result};
use findyou_core::user::{ProfileUpdate, UserRecord};

use crate::backend::Backend;
use crate::notifications::{LOGGED_OUT_MESSAGE, NotificationCenter};
use crate::state::AccountState;

const USERNAME_TAKEN_MESSAGE: &str = "username already exists";

pub struct AccountService {
    backend: Backend,
    notifications: NotificationCenter,
    state: watch::Sender<AccountState>,
}

impl AccountService {
    pub fn new(backend: Backend, notifications: NotificationCenter) -> Self {
        let (state, _) = watch::channel(AccountState::default());
        Self {
            backend,
            notifications,
            state,
        }
    }

    pub fn state(&self) -> watch::Receiver<AccountState> {
        self.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    /// Registers an account and creates its profile document.
    ///
    /// # Errors
    ///
    /// - `Validation` if any field is blank
    /// - `Conflict` if `username` is already taken
    /// - `Auth` if the provider rejects the credentials
    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        self.track("Signup Failed", async {
            require_fields(&[username, email, password])?;
            if self.backend.profiles.find_by_username(username).await?.is_some() {
                return Err(FindYouError::conflict(USERNAME_TAKEN_MESSAGE));
            }

            let session = self.backend.auth.sign_up(email, password).await?;
            let mut record = UserRecord::new(session.user_id.clone());
            record.username = username.to_string();
            self.backend.profiles.put_user(&record).await?;

            tracing::info!(user_id = %session.user_id, username, "Signed up");
            self.signed_in(session.clone(), record);
            Ok(session)
        })
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.track("Login failed", async {
            require_fields(&[email, password])?;
            let session = self.backend.auth.sign_in(email, password).await?;
            let record = self.backend.profiles.get_user(&session.user_id).await?;

            tracing::info!(user_id = %session.user_id, "Logged in");
            self.signed_in(session.clone(), record);
            Ok(session)
        })
        .await
    }

    pub async fn logout(&self, session: &Session) -> Result<()> {
        self.backend.auth.sign_out(session).await?;
        self.state.send_replace(AccountState::default());
        self.notifications.info(LOGGED_OUT_MESSAGE);
        tracing::info!(user_id = %session.user_id, "Logged out");
        Ok(())
    }

    /// Merges `update` over the stored record; unset fields keep their value.
    pub async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<UserRecord> {
        self.track("Cannot Update user", self.apply_update(session, update))
            .await
    }

    /// Uploads an image and makes it the profile picture.
    pub async fn upload_profile_image(
        &self,
        session: &Session,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UserRecord> {
        self.track("Image upload failed", async {
            let url = self.backend.images.upload(bytes, content_type).await?;
            self.apply_update(session, ProfileUpdate::image(url)).await
        })
        .await
    }

    async fn apply_update(&self, session: &Session, update: ProfileUpdate) -> Result<UserRecord> {
        let current = self.backend.profiles.get_user(&session.user_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        if let Some(username) = update.username.as_deref() {
            if username.trim().is_empty() {
                return Err(FindYouError::validation("Username must not be empty"));
            }
            if username != current.username {
                let taken = self.backend.profiles.find_by_username(username).await?;
                if taken.is_some_and(|other| other.user_id != session.user_id) {
                    return Err(FindYouError::conflict(USERNAME_TAKEN_MESSAGE));
                }
            }
        }

        let next = self
            .backend
            .profiles
            .update_profile(&session.user_id, &update)
            .await?;
        tracing::debug!(user_id = %session.user_id, "Updated profile");

        self.state.send_modify(|state| {
            if state.session.as_ref() == Some(session) {
                state.user = Some(next.clone());
            }
        });
        Ok(next)
    }

    fn signed_in(&self, session: Session, record: UserRecord) {
        self.state.send_modify(|state| {
            state.session = Some(session);
            state.user = Some(record);
        });
    }

    /// Runs `operation` with `in_progress` set and surfaces its error.
    async fn track<T, F>(&self, context: &str, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.state.send_modify(|state| state.in_progress = true);
        let result = operation.await;
        self.state.send_modify(|state| state.in_progress = false);
        if let Err(err) = &result {
            self.notifications.report_error(context, err);
        }
        result
    }
}
