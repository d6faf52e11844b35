//! Matching domain module.
//!
//! # Module Structure
//!
//! - `candidate`: Which profiles enter a user's swipe queue
//! - `protocol`: How likes become matches

mod candidate;
mod protocol;

pub use candidate::{CandidateTracker, filter_candidates, is_candidate};
pub use protocol::{LikeOutcome, MatchProtocol, MatchStep, PendingMatch};
