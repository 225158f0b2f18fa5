//! Data structures for the award bracket: candidates, releases, matches, bracket state.

mod bracket;
mod bracket_match;
mod candidate;
mod release;

pub use bracket::{
    Access, BracketError, BracketState, LowerFeed, MatchRef, Placements, SlotRef, Stage,
};
pub use bracket_match::{Match, Outcome, Round, Side};
pub use candidate::{Candidate, CandidateId};
pub use release::{Release, ReleaseKind};
