//! BracketState: upper rounds, lower rounds and the grand final of one voting session.

use crate::models::bracket_match::{Match, Round, Side};
use crate::models::candidate::Candidate;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Which ladder a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Upper,
    Lower,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Upper => write!(f, "upper"),
            Stage::Lower => write!(f, "lower"),
        }
    }
}

/// Address of a match inside one of the two ladders.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct MatchRef {
    pub stage: Stage,
    pub round: usize,
    pub index: usize,
}

impl MatchRef {
    pub fn upper(round: usize, index: usize) -> Self {
        Self {
            stage: Stage::Upper,
            round,
            index,
        }
    }

    pub fn lower(round: usize, index: usize) -> Self {
        Self {
            stage: Stage::Lower,
            round,
            index,
        }
    }
}

/// Address of one slot in the lower bracket.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SlotRef {
    pub round: usize,
    pub index: usize,
    pub side: Side,
}

/// Provenance of a lower-bracket slot: which decision put its occupant there.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LowerFeed {
    pub from: MatchRef,
    pub to: SlotRef,
}

/// Who is acting on the bracket. Only operators may decide matches.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Operator,
    #[default]
    Observer,
}

impl Access {
    pub fn from_flag(privileged: bool) -> Self {
        if privileged {
            Access::Operator
        } else {
            Access::Observer
        }
    }

    /// Operator when `given` equals the configured token. The bytes are compared in constant time.
    /// Without a configured token nobody becomes an operator.
    pub fn from_token(given: &str, expected: Option<&str>) -> Self {
        let matches = expected
            .is_some_and(|expected| bool::from(given.as_bytes().ct_eq(expected.as_bytes())));
        Self::from_flag(matches)
    }

    pub fn is_operator(self) -> bool {
        self == Access::Operator
    }
}

/// Errors returned by bracket operations. The state is left untouched whenever one is returned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketError {
    /// Caller does not hold the operator capability.
    Unauthorized,
    /// No such round in the given ladder.
    RoundOutOfRange { stage: Stage, round: usize },
    /// No such match in the given round.
    MatchOutOfRange { stage: Stage, round: usize, index: usize },
    /// The chosen side has no candidate.
    EmptySlot(Side),
    /// Both bracket champions are not known yet.
    GrandFinalNotConvened,
    /// A match fed by this one is already decided, so the decision can no longer change.
    DownstreamDecided(MatchRef),
    /// The other slot is still waiting for a candidate that has not been decided yet.
    AwaitingOpponent(MatchRef),
}

impl std::fmt::Display for BracketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketError::Unauthorized => write!(f, "Only bracket operators can pick winners"),
            BracketError::RoundOutOfRange { stage, round } => {
                write!(f, "No {} round {}", stage, round)
            }
            BracketError::MatchOutOfRange {
                stage,
                round,
                index,
            } => write!(f, "No match {} in {} round {}", index, stage, round),
            BracketError::EmptySlot(side) => write!(f, "No candidate on the {:?} side", side),
            BracketError::GrandFinalNotConvened => write!(f, "Grand final has not been convened yet"),
            BracketError::DownstreamDecided(at) => write!(
                f,
                "Match {} in {} round {} is already decided",
                at.index, at.stage, at.round
            ),
            BracketError::AwaitingOpponent(at) => write!(
                f,
                "Match {} in {} round {} is still waiting for an opponent",
                at.index, at.stage, at.round
            ),
        }
    }
}

impl std::error::Error for BracketError {}

/// Full bracket of one voting session. Owned by a single handle and mutated only through `logic`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketState {
    /// Seeded field snapshot, in the order it was given.
    pub field: Vec<Candidate>,
    pub upper: Vec<Round>,
    pub lower: Vec<Round>,
    pub grand_final: Option<Match>,
    /// Every insertion into the lower bracket, oldest first.
    pub lower_feeds: Vec<LowerFeed>,
}

impl BracketState {
    /// Round `round` of the given ladder.
    pub fn round(&self, stage: Stage, round: usize) -> Result<&Round, BracketError> {
        let rounds = match stage {
            Stage::Upper => &self.upper,
            Stage::Lower => &self.lower,
        };
        rounds
            .get(round)
            .ok_or(BracketError::RoundOutOfRange { stage, round })
    }

    /// Match at `at`, or the matching out-of-range error.
    pub fn get_match(&self, at: MatchRef) -> Result<&Match, BracketError> {
        self.round(at.stage, at.round)?
            .matches
            .get(at.index)
            .ok_or(BracketError::MatchOutOfRange {
                stage: at.stage,
                round: at.round,
                index: at.index,
            })
    }

    pub fn get_match_mut(&mut self, at: MatchRef) -> Result<&mut Match, BracketError> {
        let rounds = match at.stage {
            Stage::Upper => &mut self.upper,
            Stage::Lower => &mut self.lower,
        };
        rounds
            .get_mut(at.round)
            .ok_or(BracketError::RoundOutOfRange {
                stage: at.stage,
                round: at.round,
            })?
            .matches
            .get_mut(at.index)
            .ok_or(BracketError::MatchOutOfRange {
                stage: at.stage,
                round: at.round,
                index: at.index,
            })
    }

    /// Lower-bracket insertion produced by the decision on `from`, if any.
    pub fn feed_from(&self, from: MatchRef) -> Option<&LowerFeed> {
        self.lower_feeds.iter().find(|feed| feed.from == from)
    }

    /// Position of a candidate in the seeded field (used as a stable tie-break).
    pub fn field_position(&self, candidate: &Candidate) -> usize {
        self.field
            .iter()
            .position(|c| c.id == candidate.id)
            .unwrap_or(usize::MAX)
    }
}

/// Final standings, computed from a bracket. `None` means not determined yet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Placements {
    pub first: Option<Candidate>,
    pub second: Option<Candidate>,
    pub third: Option<Candidate>,
    pub fourth: Option<Candidate>,
    pub fifth: Option<Candidate>,
}
