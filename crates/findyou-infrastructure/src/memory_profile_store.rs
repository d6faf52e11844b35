//! In-memory implementation of [`ProfileStore`].
//!
//! Records are kept as versioned JSON documents, exactly as the hosted
//! database would hold them, and decoded through [`DocumentCodec`] on every
//! read. Subscriptions are fed from a broadcast channel of change events.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock, broadcast};

use findyou_core::FindYouError;
use findyou_core::error::{FailureCause, Result};
use findyou_core::user::{
    Gender, PopulationSubscription, ProfileStore, ProfileUpdate, RelationshipList, UserRecord,
    UserSubscription,
};

use crate::dto::DocumentCodec;
use crate::fault::FaultPlan;

const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
enum StoreEvent {
    Changed(String),
    Outage(String),
}

struct Inner {
    documents: RwLock<HashMap<String, Value>>,
    codec: DocumentCodec,
    events: broadcast::Sender<StoreEvent>,
    faults: Mutex<FaultPlan>,
}

impl Inner {
    async fn load_user(&self, user_id: &str) -> Result<UserRecord> {
        let document = {
            let documents = self.documents.read().await;
            documents
                .get(user_id)
                .cloned()
                .ok_or_else(|| FindYouError::not_found("user", user_id))?
        };
        self.codec.decode_user(document)
    }

    async fn snapshot(&self, genders: &[Gender]) -> Vec<UserRecord> {
        let documents = self.documents.read().await;
        let mut records: Vec<UserRecord> = documents
            .iter()
            .filter_map(|(id, document)| match self.codec.decode_user(document.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(user_id = %id, error = %e, "Skipping malformed user document");
                    None
                }
            })
            .filter(|record| genders.contains(&record.gender))
            .collect();
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        records
    }

    async fn check_fault(&self, key: &str) -> Result<()> {
        self.faults.lock().await.check(key)
    }

    async fn ensure_online(&self) -> Result<()> {
        if self.faults.lock().await.is_offline() {
            Err(FindYouError::data_unavailable("backend offline"))
        } else {
            Ok(())
        }
    }

    fn notify(&self, event: StoreEvent) {
        // No receivers just means nobody is subscribed.
        let _ = self.events.send(event);
    }

    /// Read-modify-write of one list on one document.
    async fn modify_list(
        &self,
        user_id: &str,
        list: RelationshipList,
        value: &str,
        insert: bool,
    ) -> Result<()> {
        self.check_fault(user_id).await?;
        let changed = {
            let mut documents = self.documents.write().await;
            let document = documents
                .get(user_id)
                .cloned()
                .ok_or_else(|| FindYouError::not_found("user", user_id))?;
            let mut record = self.codec.decode_user(document)?;
            let changed = if insert {
                record.list_mut(list).insert(value.to_string())
            } else {
                record.list_mut(list).remove(value)
            };
            if changed {
                documents.insert(user_id.to_string(), self.codec.encode_user(&record)?);
            }
            changed
        };
        if changed {
            tracing::debug!(
                user_id,
                list = list.field_name(),
                value,
                insert,
                "Updated relationship list"
            );
            self.notify(StoreEvent::Changed(user_id.to_string()));
        }
        Ok(())
    }

    /// Read-modify-write of the display fields of one document.
    async fn merge_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRecord> {
        self.check_fault(user_id).await?;
        let next = {
            let mut documents = self.documents.write().await;
            let document = documents
                .get(user_id)
                .cloned()
                .ok_or_else(|| FindYouError::not_found("user", user_id))?;
            let current = self.codec.decode_user(document)?;
            let next = update.apply_to(&current);
            documents.insert(user_id.to_string(), self.codec.encode_user(&next)?);
            next
        };
        tracing::debug!(user_id, "Merged profile fields");
        self.notify(StoreEvent::Changed(user_id.to_string()));
        Ok(next)
    }
}

/// Process-local stand-in for the hosted profile database.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone)]
pub struct InMemoryProfileStore {
    inner: Arc<Inner>,
}

impl InMemoryProfileStore {
    pub fn new() -> Result<Self> {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Creates a store whose change feed buffers `capacity` events per
    /// subscriber. A subscriber that falls further behind receives a fresh
    /// snapshot instead of the missed events.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FindYouError::config("event capacity must be positive"));
        }
        let (events, _) = broadcast::channel(capacity);
        Ok(Self {
            inner: Arc::new(Inner {
                documents: RwLock::new(HashMap::new()),
                codec: DocumentCodec::new()?,
                events,
                faults: Mutex::new(FaultPlan::default()),
            }),
        })
    }

    /// Stores a raw document, bypassing the codec. Used for seeding
    /// documents written by older clients, or malformed ones.
    pub async fn insert_document(&self, user_id: &str, document: Value) {
        self.inner
            .documents
            .write()
            .await
            .insert(user_id.to_string(), document);
        self.inner.notify(StoreEvent::Changed(user_id.to_string()));
    }

    /// Returns the raw stored document.
    pub async fn document(&self, user_id: &str) -> Option<Value> {
        self.inner.documents.read().await.get(user_id).cloned()
    }

    /// Makes the next `times` writes to `user_id`'s record fail with `cause`.
    pub async fn fail_next_writes(&self, user_id: &str, times: u32, cause: FailureCause) {
        self.inner.faults.lock().await.fail_next(user_id, times, cause);
    }

    /// Takes the whole backend offline or back online.
    ///
    /// Going offline also reports an error on every open subscription.
    pub async fn set_offline(&self, offline: bool) {
        self.inner.faults.lock().await.set_offline(offline);
        if offline {
            self.simulate_outage("backend offline");
        }
    }

    /// Reports a transient error on every open subscription without
    /// changing any data.
    pub fn simulate_outage(&self, message: &str) {
        tracing::warn!(message, "Simulating profile store outage");
        self.inner.notify(StoreEvent::Outage(message.to_string()));
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_user(&self, user_id: &str) -> Result<UserRecord> {
        self.inner.ensure_online().await?;
        self.inner.load_user(user_id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.inner.ensure_online().await?;
        let records = self.inner.snapshot(&Gender::ALL).await;
        Ok(records
            .into_iter()
            .find(|record| !record.username.is_empty() && record.username == username))
    }

    async fn put_user(&self, record: &UserRecord) -> Result<()> {
        self.inner.check_fault(&record.user_id).await?;
        let document = self.inner.codec.encode_user(record)?;
        self.inner
            .documents
            .write()
            .await
            .insert(record.user_id.clone(), document);
        tracing::debug!(user_id = %record.user_id, "Stored user record");
        self.inner.notify(StoreEvent::Changed(record.user_id.clone()));
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRecord> {
        self.inner.merge_profile(user_id, update).await
    }

    async fn subscribe_user(&self, user_id: &str) -> Result<UserSubscription> {
        self.inner.ensure_online().await?;
        let receiver = self.inner.events.subscribe();
        let initial = self.inner.load_user(user_id).await?;

        let state = (self.inner.clone(), receiver, user_id.to_string());
        let updates = stream::unfold(state, |(inner, mut receiver, user_id)| async move {
            loop {
                let item = match receiver.recv().await {
                    Ok(StoreEvent::Changed(id)) if id == user_id => inner.load_user(&user_id).await,
                    Ok(StoreEvent::Changed(_)) => continue,
                    Ok(StoreEvent::Outage(message)) => Err(FindYouError::data_unavailable(message)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%user_id, skipped, "User subscription lagged, reloading");
                        inner.load_user(&user_id).await
                    }
                    Err(RecvError::Closed) => return None,
                };
                return Some((item, (inner, receiver, user_id)));
            }
        });

        Ok(stream::once(async move { Ok(initial) })
            .chain(updates)
            .boxed())
    }

    async fn query_users_by_gender(&self, genders: &[Gender]) -> Result<PopulationSubscription> {
        self.inner.ensure_online().await?;
        let receiver = self.inner.events.subscribe();
        let genders = genders.to_vec();
        let initial = self.inner.snapshot(&genders).await;

        let state = (self.inner.clone(), receiver, genders);
        let updates = stream::unfold(state, |(inner, mut receiver, genders)| async move {
            let item = match receiver.recv().await {
                Ok(StoreEvent::Changed(_)) => Ok(inner.snapshot(&genders).await),
                Ok(StoreEvent::Outage(message)) => Err(FindYouError::data_unavailable(message)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Population subscription lagged, reloading");
                    Ok(inner.snapshot(&genders).await)
                }
                Err(RecvError::Closed) => return None,
            };
            Some((item, (inner, receiver, genders)))
        });

        Ok(stream::once(async move { Ok(initial) })
            .chain(updates)
            .boxed())
    }

    async fn add_to_list(&self, user_id: &str, list: RelationshipList, value: &str) -> Result<()> {
        self.inner.modify_list(user_id, list, value, true).await
    }

    async fn remove_from_list(
        &self,
        user_id: &str,
        list: RelationshipList,
        value: &str,
    ) -> Result<()> {
        self.inner.modify_list(user_id, list, value, false).await
    }
}
