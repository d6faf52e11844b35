//! End-to-end flows through the application services on the in-memory backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::timeout;

use findyou_application::{
    AccountService, CandidateState, FindYouApp, InMemoryBackend, Notification, NotificationCenter,
    NotificationKind,
};
use findyou_core::config::{FindYouConfig, MatchSettings};
use findyou_core::error::{FailureCause, Result};
use findyou_core::matching::LikeOutcome;
use findyou_core::user::{
    Gender, PopulationSubscription, ProfileStore, ProfileUpdate, RelationshipList, UserRecord,
    UserSubscription,
};
use findyou_core::{FindYouError, Session};
use findyou_infrastructure::InMemoryProfileStore;

const WAIT: Duration = Duration::from_secs(2);

fn app() -> (InMemoryBackend, FindYouApp) {
    let memory = InMemoryBackend::new(64).unwrap();
    let config = FindYouConfig {
        matching: MatchSettings {
            max_attempts: 2,
            retry_backoff_ms: 1,
        },
        ..FindYouConfig::default()
    };
    let app = FindYouApp::new(memory.backend(), &config);
    (memory, app)
}

fn drain(receiver: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut all = Vec::new();
    while let Ok(notification) = receiver.try_recv() {
        all.push(notification);
    }
    all
}

async fn register(app: &FindYouApp, username: &str, gender: Gender, preference: Gender) -> Session {
    let session = app
        .account()
        .sign_up(username, &format!("{}@example.com", username), "secret1")
        .await
        .unwrap();
    app.account()
        .update_profile(
            &session,
            ProfileUpdate {
                name: Some(username.to_uppercase()),
                gender: Some(gender),
                gender_preference: Some(preference),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    session
}

/// Applies one list mutation right after the next `get_user`, the way a
/// counterpart's swipe can land between a read and a write.
struct InterleavingStore {
    inner: InMemoryProfileStore,
    pending: Mutex<Option<(RelationshipList, String)>>,
}

impl InterleavingStore {
    fn new(inner: InMemoryProfileStore) -> Self {
        Self {
            inner,
            pending: Mutex::new(None),
        }
    }

    fn after_next_read(&self, list: RelationshipList, value: &str) {
        *self.pending.lock().unwrap() = Some((list, value.to_string()));
    }
}

#[async_trait]
impl ProfileStore for InterleavingStore {
    async fn get_user(&self, user_id: &str) -> Result<UserRecord> {
        let record = self.inner.get_user(user_id).await?;
        let pending = self.pending.lock().unwrap().take();
        if let Some((list, value)) = pending {
            self.inner.add_to_list(user_id, list, &value).await?;
        }
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.inner.find_by_username(username).await
    }

    async fn put_user(&self, record: &UserRecord) -> Result<()> {
        self.inner.put_user(record).await
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRecord> {
        self.inner.update_profile(user_id, update).await
    }

    async fn subscribe_user(&self, user_id: &str) -> Result<UserSubscription> {
        self.inner.subscribe_user(user_id).await
    }

    async fn query_users_by_gender(&self, genders: &[Gender]) -> Result<PopulationSubscription> {
        self.inner.query_users_by_gender(genders).await
    }

    async fn add_to_list(&self, user_id: &str, list: RelationshipList, value: &str) -> Result<()> {
        self.inner.add_to_list(user_id, list, value).await
    }

    async fn remove_from_list(
        &self,
        user_id: &str,
        list: RelationshipList,
        value: &str,
    ) -> Result<()> {
        self.inner.remove_from_list(user_id, list, value).await
    }
}

fn ids(state: &CandidateState) -> Vec<String> {
    let mut ids: Vec<_> = state.candidates.iter().map(|c| c.username.clone()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_sign_up_requires_every_field() {
    let (_, app) = app();
    let mut notifications = app.notifications();

    let err = app
        .account()
        .sign_up("alice", "", "secret1")
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let shown = drain(&mut notifications);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].message, "Please fill in all fields");
    assert!(!app.account().state().borrow().in_progress);
}

#[tokio::test]
async fn test_sign_up_rejects_taken_username() {
    let (_, app) = app();
    app.account()
        .sign_up("alice", "alice@example.com", "secret1")
        .await
        .unwrap();
    let mut notifications = app.notifications();

    let err = app
        .account()
        .sign_up("alice", "other@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, FindYouError::Conflict(_)));
    assert_eq!(drain(&mut notifications)[0].message, "username already exists");
}

#[tokio::test]
async fn test_sign_up_creates_profile_and_signs_in() {
    let (memory, app) = app();
    let session = app
        .account()
        .sign_up("alice", "alice@example.com", "secret1")
        .await
        .unwrap();

    let state = app.account().state().borrow().clone();
    assert!(state.signed_in());
    assert_eq!(state.user.as_ref().unwrap().username, "alice");

    let stored = memory.profiles.get_user(&session.user_id).await.unwrap();
    assert_eq!(stored.gender, Gender::Any);
    assert_eq!(stored.gender_preference, Gender::Any);
}

#[tokio::test]
async fn test_login_and_logout() {
    let (_, app) = app();
    let created = app
        .account()
        .sign_up("alice", "alice@example.com", "secret1")
        .await
        .unwrap();
    app.account().logout(&created).await.unwrap();
    let mut notifications = app.notifications();

    let err = app
        .account()
        .login("alice@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, FindYouError::Auth(_)));
    assert_eq!(
        drain(&mut notifications)[0].message,
        "Login failed: Invalid email or password"
    );

    let session = app
        .account()
        .login("alice@example.com", "secret1")
        .await
        .unwrap();
    assert_eq!(session.user_id, created.user_id);
    assert_eq!(app.account().current_session(), Some(session.clone()));

    app.account().logout(&session).await.unwrap();
    assert!(!app.account().state().borrow().signed_in());
    let shown = drain(&mut notifications);
    assert_eq!(shown.last().unwrap().message, "Logged out");
    assert_eq!(shown.last().unwrap().kind, NotificationKind::Info);
}

#[tokio::test]
async fn test_profile_update_merges_fields() {
    let (_, app) = app();
    let session = register(&app, "alice", Gender::Female, Gender::Male).await;

    let updated = app
        .account()
        .update_profile(
            &session,
            ProfileUpdate {
                bio: Some("hiking and coffee".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.bio, "hiking and coffee");
    assert_eq!(updated.name, "ALICE");
    assert_eq!(updated.gender, Gender::Female);
    assert_eq!(updated.gender_preference, Gender::Male);
    assert_eq!(app.account().state().borrow().user.as_ref(), Some(&updated));
}

#[tokio::test]
async fn test_profile_update_keeps_list_changes_made_during_the_edit() {
    let memory = InMemoryBackend::new(64).unwrap();
    let store = Arc::new(InterleavingStore::new(memory.profiles.clone()));
    let mut backend = memory.backend();
    backend.profiles = store.clone();
    let account = AccountService::new(backend, NotificationCenter::default());
    let alice = account
        .sign_up("alice", "alice@example.com", "secret1")
        .await
        .unwrap();

    store.after_next_read(RelationshipList::Matched, "bob");
    let updated = account
        .update_profile(
            &alice,
            ProfileUpdate {
                bio: Some("hi".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.matched.contains("bob"));

    let stored = memory.profiles.get_user(&alice.user_id).await.unwrap();
    assert_eq!(stored.bio, "hi");
    assert!(stored.matched.contains("bob"));
}

#[tokio::test]
async fn test_profile_update_rejects_taken_username() {
    let (_, app) = app();
    register(&app, "alice", Gender::Female, Gender::Male).await;
    let bob = register(&app, "bob", Gender::Male, Gender::Any).await;

    let err = app
        .account()
        .update_profile(
            &bob,
            ProfileUpdate {
                username: Some("alice".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FindYouError::Conflict(_)));
}

#[tokio::test]
async fn test_profile_image_upload_sets_image_url() {
    let (memory, app) = app();
    let session = register(&app, "alice", Gender::Female, Gender::Male).await;

    let updated = app
        .account()
        .upload_profile_image(&session, vec![0xff, 0xd8, 0xff], "image/jpeg")
        .await
        .unwrap();

    assert!(updated.image_url.starts_with("memory://images/"));
    assert!(memory.images.fetch(&updated.image_url).await.is_some());
    assert_eq!(updated.name, "ALICE");
}

#[tokio::test]
async fn test_feed_follows_population_and_own_swipes() {
    let (_, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;
    let bob = register(&app, "bob", Gender::Male, Gender::Any).await;
    register(&app, "carol", Gender::Male, Gender::Female).await;
    register(&app, "dana", Gender::Female, Gender::Male).await;

    let feed = app.candidate_feed(&alice);
    let state = timeout(WAIT, feed.wait_for(|s| s.candidates.len() == 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&state), vec!["bob", "carol"]);
    assert!(!state.loading);

    // Bob now only wants men, so alice no longer fits him.
    app.account()
        .update_profile(
            &bob,
            ProfileUpdate {
                gender_preference: Some(Gender::Male),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    let state = timeout(WAIT, feed.wait_for(|s| s.candidates.len() == 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&state), vec!["carol"]);

    let carol_id = state.candidates[0].user_id.clone();
    app.swipe().dislike(&alice, &carol_id).await.unwrap();
    let state = timeout(WAIT, feed.wait_for(|s| s.candidates.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_feed_requeries_when_preference_changes() {
    let (_, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;
    register(&app, "bob", Gender::Male, Gender::Any).await;
    register(&app, "erin", Gender::Female, Gender::Any).await;

    let feed = app.candidate_feed(&alice);
    let state = timeout(WAIT, feed.wait_for(|s| !s.loading && s.candidates.len() == 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&state), vec!["bob"]);

    app.account()
        .update_profile(
            &alice,
            ProfileUpdate {
                gender_preference: Some(Gender::Any),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    let state = timeout(WAIT, feed.wait_for(|s| s.candidates.len() == 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&state), vec!["bob", "erin"]);
}

#[tokio::test]
async fn test_feed_keeps_candidates_during_outage() {
    let (memory, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;
    register(&app, "bob", Gender::Male, Gender::Any).await;

    let feed = app.candidate_feed(&alice);
    timeout(WAIT, feed.wait_for(|s| s.candidates.len() == 1))
        .await
        .unwrap()
        .unwrap();
    let mut notifications = app.notifications();

    memory.profiles.simulate_outage("connection reset");
    let state = timeout(WAIT, feed.wait_for(|s| s.error.is_some()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&state), vec!["bob"]);

    let shown = timeout(WAIT, notifications.recv()).await.unwrap().unwrap();
    assert!(shown.is_error());
}

#[tokio::test]
async fn test_closing_the_feed_detaches_it() {
    let (_, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;

    let feed = app.candidate_feed(&alice);
    let mut state = feed.state();
    timeout(WAIT, feed.wait_for(|s| !s.loading)).await.unwrap().unwrap();

    feed.close();
    timeout(WAIT, async {
        while state.changed().await.is_ok() {}
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_mutual_like_notifies_and_opens_a_chat() {
    let (_, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;
    let bob = register(&app, "bob", Gender::Male, Gender::Any).await;
    let mut notifications = app.notifications();

    let first = app.swipe().like(&bob, &alice.user_id).await.unwrap();
    assert_eq!(first, LikeOutcome::Liked);
    assert!(drain(&mut notifications).is_empty());

    let second = app.swipe().like(&alice, &bob.user_id).await.unwrap();
    assert!(second.is_match());
    let shown = drain(&mut notifications);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].message, "Match!");

    let chats = app.chat().list_chats(&bob).await.unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].counterpart.user_id, alice.user_id);
    assert_eq!(chats[0].counterpart.display_name, "alice");

    let open = app.chat().open_chat(&bob, &chats[0].channel_id).await.unwrap();
    assert_eq!(open.counterpart().user_id, alice.user_id);
    assert!(open.messages().is_empty());

    let sent = app
        .chat()
        .send_reply(&alice, &chats[0].channel_id, "  hi bob  ")
        .await
        .unwrap();
    assert!(sent);
    let ignored = app
        .chat()
        .send_reply(&alice, &chats[0].channel_id, "   ")
        .await
        .unwrap();
    assert!(!ignored);

    let messages = timeout(WAIT, open.wait_for_messages(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message, "hi bob");
    assert_eq!(messages[0].sent_by, alice.user_id);
    open.close();
}

#[tokio::test]
async fn test_outsiders_cannot_open_a_chat() {
    let (_, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;
    let bob = register(&app, "bob", Gender::Male, Gender::Any).await;
    let carol = register(&app, "carol", Gender::Male, Gender::Female).await;
    app.swipe().like(&bob, &alice.user_id).await.unwrap();
    app.swipe().like(&alice, &bob.user_id).await.unwrap();

    let chats = app.chat().list_chats(&alice).await.unwrap();
    assert!(app.chat().list_chats(&carol).await.unwrap().is_empty());
    let err = app
        .chat()
        .open_chat(&carol, &chats[0].channel_id)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, FindYouError::Auth(_)));
}

#[tokio::test]
async fn test_outsiders_cannot_post_to_a_chat() {
    let (_, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;
    let bob = register(&app, "bob", Gender::Male, Gender::Any).await;
    let carol = register(&app, "carol", Gender::Male, Gender::Female).await;
    app.swipe().like(&bob, &alice.user_id).await.unwrap();
    app.swipe().like(&alice, &bob.user_id).await.unwrap();
    let chats = app.chat().list_chats(&alice).await.unwrap();
    let mut notifications = app.notifications();

    let err = app
        .chat()
        .send_reply(&carol, &chats[0].channel_id, "hello there")
        .await
        .unwrap_err();
    assert!(matches!(err, FindYouError::Auth(_)));
    assert!(drain(&mut notifications).iter().all(|n| n.is_error()));

    let open = app.chat().open_chat(&alice, &chats[0].channel_id).await.unwrap();
    assert!(open.messages().is_empty());
    open.close();
}

#[tokio::test]
async fn test_incomplete_match_is_retried_later() {
    let (memory, app) = app();
    let alice = register(&app, "alice", Gender::Female, Gender::Male).await;
    let bob = register(&app, "bob", Gender::Male, Gender::Any).await;
    app.swipe().like(&bob, &alice.user_id).await.unwrap();

    memory
        .profiles
        .fail_next_writes(&bob.user_id, 10, FailureCause::Permission)
        .await;
    let mut notifications = app.notifications();

    let err = app.swipe().like(&alice, &bob.user_id).await.unwrap_err();
    assert!(err.is_partial_mutation());
    assert_eq!(app.swipe().pending_count().await, 1);
    let shown = drain(&mut notifications);
    assert!(shown.iter().all(|n| n.kind != NotificationKind::Match));
    assert!(shown.iter().any(|n| n.is_error()));

    // Someone else's retry leaves alice's pending match alone.
    assert!(app.swipe().retry_pending(&bob).await.is_empty());
    assert_eq!(app.swipe().pending_count().await, 1);

    memory
        .profiles
        .fail_next_writes(&bob.user_id, 0, FailureCause::Permission)
        .await;
    let confirmed = app.swipe().retry_pending(&alice).await;
    assert_eq!(confirmed.len(), 1);
    assert_eq!(app.swipe().pending_count().await, 0);
    assert_eq!(drain(&mut notifications).last().unwrap().message, "Match!");

    let bob_record = memory.profiles.get_user(&bob.user_id).await.unwrap();
    assert!(bob_record.matched.contains(&alice.user_id));
    assert!(bob_record.liked.is_empty());
    assert_eq!(memory.chats.channel_count().await, 1);
}
