//! Candidate selection for the swipe queue.

use crate::error::FindYouError;
use crate::user::UserRecord;

/// Returns true if `candidate` may be shown to `caller`.
///
/// Both sides' gender preferences must accept the other's gender, and the
/// caller must not have swiped on or matched the candidate yet.
pub fn is_candidate(caller: &UserRecord, candidate: &UserRecord) -> bool {
    candidate.user_id != caller.user_id
        && caller.gender_preference.accepts(candidate.gender)
        && candidate.gender_preference.accepts(caller.gender)
        && !caller.has_interacted_with(&candidate.user_id)
}

/// Keeps the members of `population` that are candidates for `caller`.
///
/// Input order is preserved but carries no meaning.
pub fn filter_candidates<'a, I>(caller: &UserRecord, population: I) -> Vec<UserRecord>
where
    I: IntoIterator<Item = &'a UserRecord>,
{
    population
        .into_iter()
        .filter(|candidate| is_candidate(caller, candidate))
        .cloned()
        .collect()
}

/// Keeps the candidate list in step with a changing caller and population.
///
/// Every accepted update recomputes the list from scratch. Errors leave the
/// last computed list in place.
#[derive(Debug, Default)]
pub struct CandidateTracker {
    caller: Option<UserRecord>,
    population: Vec<UserRecord>,
    candidates: Vec<UserRecord>,
    last_error: Option<FindYouError>,
}

impl CandidateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the caller's own record.
    pub fn update_caller(&mut self, caller: UserRecord) -> &[UserRecord] {
        self.caller = Some(caller);
        self.recompute()
    }

    /// Replaces the population snapshot.
    pub fn update_population(&mut self, population: Vec<UserRecord>) -> &[UserRecord] {
        self.population = population;
        self.recompute()
    }

    /// Records a data source failure without touching the candidates.
    pub fn record_error(&mut self, error: FindYouError) {
        self.last_error = Some(error);
    }

    pub fn candidates(&self) -> &[UserRecord] {
        &self.candidates
    }

    pub fn caller(&self) -> Option<&UserRecord> {
        self.caller.as_ref()
    }

    pub fn last_error(&self) -> Option<&FindYouError> {
        self.last_error.as_ref()
    }

    fn recompute(&mut self) -> &[UserRecord] {
        self.last_error = None;
        self.candidates = match &self.caller {
            Some(caller) => filter_candidates(caller, &self.population),
            None => Vec::new(),
        };
        &self.candidates
    }
}
