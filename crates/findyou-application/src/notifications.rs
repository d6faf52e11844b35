//! The single user-facing notification channel.
//!
//! Every message a user should see, success or failure, goes through one
//! [`NotificationCenter`]. Errors are logged at `warn` when they are surfaced.

use tokio::sync::broadcast;

use findyou_core::FindYouError;

/// Message shown when a like confirms a match.
pub const MATCH_MESSAGE: &str = "Match!";

/// Message shown after logging out.
pub const LOGGED_OUT_MESSAGE: &str = "Logged out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Match,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Broadcasts notifications to every subscribed view.
///
/// Sending never fails; without subscribers the message is only logged.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.publish(NotificationKind::Info, message.into())
    }

    pub fn matched(&self) -> Notification {
        self.publish(NotificationKind::Match, MATCH_MESSAGE.to_string())
    }

    /// Surfaces `error` as `"<context>: <message>"`.
    ///
    /// Validation and conflict errors already carry the final wording and are
    /// shown without a context prefix.
    pub fn report_error(&self, context: &str, error: &FindYouError) -> Notification {
        tracing::warn!(context, error = %error, "Surfacing error to user");
        let detail = error.user_message();
        let message = match error {
            FindYouError::Validation(_) | FindYouError::Conflict(_) => detail,
            _ if context.is_empty() => detail,
            _ => format!("{}: {}", context, detail),
        };
        self.publish(NotificationKind::Error, message)
    }

    fn publish(&self, kind: NotificationKind, message: String) -> Notification {
        let notification = Notification { kind, message };
        if self.sender.send(notification.clone()).is_err() {
            tracing::debug!(message = %notification.message, "No notification subscribers");
        }
        notification
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_message_carries_context() {
        let center = NotificationCenter::default();
        let mut receiver = center.subscribe();

        center.report_error("Login failed", &FindYouError::auth("Invalid email or password"));
        let notification = receiver.recv().await.unwrap();
        assert!(notification.is_error());
        assert_eq!(notification.message, "Login failed: Invalid email or password");
    }

    #[tokio::test]
    async fn test_validation_message_is_shown_verbatim() {
        let center = NotificationCenter::default();
        let mut receiver = center.subscribe();

        center.report_error("Signup Failed", &FindYouError::validation("Please fill in all fields"));
        assert_eq!(receiver.recv().await.unwrap().message, "Please fill in all fields");
    }

    #[tokio::test]
    async fn test_match_notification() {
        let center = NotificationCenter::default();
        let mut receiver = center.subscribe();

        center.matched();
        let notification = receiver.recv().await.unwrap();
        assert_eq!(notification.kind, NotificationKind::Match);
        assert_eq!(notification.message, MATCH_MESSAGE);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let center = NotificationCenter::new(1);
        assert_eq!(center.info("hello").message, "hello");
    }
}
