//! Live candidate feed.
//!
//! A background task watches the signed-in user's own record and the
//! population matching their preference, recomputing the candidate set on
//! every change of either. When the preference changes the population
//! query is replaced.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use findyou_core::error::Result;
use findyou_core::{FindYouError, Session};
use findyou_core::matching::CandidateTracker;
use findyou_core::user::{Gender, PopulationSubscription, ProfileStore, UserRecord};

use crate::notifications::NotificationCenter;
use crate::state::CandidateState;

const CALLER_ERROR_CONTEXT: &str = "Cannot retrieve user data";
const POPULATION_ERROR_CONTEXT: &str = "Cannot load profiles";

/// Handle to a running feed. Dropping it stops the task and detaches both
/// subscriptions.
pub struct CandidateFeed {
    state: watch::Receiver<CandidateState>,
    task: JoinHandle<()>,
}

impl CandidateFeed {
    /// Spawns the feed for `session`. Must be called inside a tokio runtime.
    pub fn start(
        profiles: Arc<dyn ProfileStore>,
        notifications: NotificationCenter,
        session: Session,
    ) -> Self {
        let (sender, state) = watch::channel(CandidateState::default());
        let worker = FeedWorker {
            profiles,
            notifications,
            session,
            sender,
            tracker: CandidateTracker::new(),
            population_ready: false,
        };
        let task = tokio::spawn(worker.run());
        Self { state, task }
    }

    pub fn state(&self) -> watch::Receiver<CandidateState> {
        self.state.clone()
    }

    pub fn candidates(&self) -> Vec<UserRecord> {
        self.state.borrow().candidates.clone()
    }

    /// Waits until the published state satisfies `predicate`.
    pub async fn wait_for<F>(&self, predicate: F) -> Option<CandidateState>
    where
        F: FnMut(&CandidateState) -> bool,
    {
        let mut state = self.state.clone();
        match state.wait_for(predicate).await {
            Ok(current) => Some(current.clone()),
            Err(_) => None,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the feed. Equivalent to dropping it.
    pub fn close(self) {}
}

impl Drop for CandidateFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum FeedEvent {
    Caller(Option<Result<UserRecord>>),
    Population(Option<Result<Vec<UserRecord>>>),
}

struct FeedWorker {
    profiles: Arc<dyn ProfileStore>,
    notifications: NotificationCenter,
    session: Session,
    sender: watch::Sender<CandidateState>,
    tracker: CandidateTracker,
    population_ready: bool,
}

impl FeedWorker {
    async fn run(mut self) {
        let user_id = self.session.user_id.clone();
        let mut own = match self.profiles.subscribe_user(&user_id).await {
            Ok(subscription) => subscription,
            Err(err) => {
                self.fail(CALLER_ERROR_CONTEXT, err);
                return;
            }
        };
        let mut population: Option<(Gender, PopulationSubscription)> = None;
        tracing::debug!(%user_id, "Candidate feed started");

        loop {
            let event = tokio::select! {
                item = own.next() => FeedEvent::Caller(item),
                item = next_snapshot(&mut population) => FeedEvent::Population(item),
            };

            match event {
                FeedEvent::Caller(Some(Ok(record))) => {
                    let preference = record.gender_preference;
                    self.tracker.update_caller(record);
                    if population.as_ref().map(|(queried, _)| *queried) != Some(preference) {
                        population = self.query(preference).await;
                    }
                    self.publish();
                }
                FeedEvent::Caller(Some(Err(err))) => self.fail(CALLER_ERROR_CONTEXT, err),
                FeedEvent::Caller(None) => break,
                FeedEvent::Population(Some(Ok(snapshot))) => {
                    self.population_ready = true;
                    self.tracker.update_population(snapshot);
                    self.publish();
                }
                FeedEvent::Population(Some(Err(err))) => self.fail(POPULATION_ERROR_CONTEXT, err),
                FeedEvent::Population(None) => {
                    tracing::debug!(%user_id, "Population subscription ended");
                    population = None;
                }
            }
        }
        tracing::debug!(%user_id, "Candidate feed stopped");
    }

    async fn query(&mut self, preference: Gender) -> Option<(Gender, PopulationSubscription)> {
        let genders = preference.acceptable_genders();
        match self.profiles.query_users_by_gender(&genders).await {
            Ok(subscription) => {
                tracing::debug!(%preference, "Subscribed to population");
                Some((preference, subscription))
            }
            Err(err) => {
                self.fail(POPULATION_ERROR_CONTEXT, err);
                None
            }
        }
    }

    fn publish(&self) {
        let candidates = self.tracker.candidates().to_vec();
        let loading = self.tracker.caller().is_none() || !self.population_ready;
        self.sender.send_replace(CandidateState {
            candidates,
            loading,
            error: None,
        });
    }

    /// Keeps the last candidate set and surfaces the failure.
    fn fail(&mut self, context: &str, err: FindYouError) {
        self.notifications.report_error(context, &err);
        let message = err.user_message();
        self.tracker.record_error(err);
        self.sender.send_modify(|state| {
            state.loading = false;
            state.error = Some(message);
        });
    }
}

async fn next_snapshot(
    population: &mut Option<(Gender, PopulationSubscription)>,
) -> Option<Result<Vec<UserRecord>>> {
    match population {
        Some((_, subscription)) => subscription.next().await,
        None => futures::future::pending().await,
    }
}
