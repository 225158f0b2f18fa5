//! Match, Side and Outcome: the atomic unit of the bracket.

use crate::models::candidate::Candidate;
use serde::{Deserialize, Serialize};

/// One of the two slots of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Slot a winner lands in when it leaves match `index`: even feeds left, odd feeds right.
    pub fn for_source(index: usize) -> Self {
        if index % 2 == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Decision state of a match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "side", rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Pending,
    Winner(Side),
}

/// A single match between up to two candidates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Position within its round.
    pub id: usize,
    pub left: Option<Candidate>,
    pub right: Option<Candidate>,
    pub outcome: Outcome,
}

impl Match {
    /// Empty, undecided match waiting for feeders.
    pub fn open(id: usize) -> Self {
        Self {
            id,
            left: None,
            right: None,
            outcome: Outcome::Pending,
        }
    }

    /// Match built from a seeded pair. A lone occupant gets a bye straight away.
    pub fn seeded(id: usize, left: Option<Candidate>, right: Option<Candidate>) -> Self {
        let mut seeded = Self {
            id,
            left,
            right,
            outcome: Outcome::Pending,
        };
        if let Some(side) = seeded.lone_side() {
            seeded.outcome = Outcome::Winner(side);
        }
        seeded
    }

    pub fn slot(&self, side: Side) -> Option<&Candidate> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    pub fn set_slot(&mut self, side: Side, candidate: Option<Candidate>) {
        match side {
            Side::Left => self.left = candidate,
            Side::Right => self.right = candidate,
        }
    }

    pub fn winner_side(&self) -> Option<Side> {
        match self.outcome {
            Outcome::Pending => None,
            Outcome::Winner(side) => Some(side),
        }
    }

    pub fn is_decided(&self) -> bool {
        self.winner_side().is_some()
    }

    /// Occupant of the winning side, if decided.
    pub fn winner(&self) -> Option<&Candidate> {
        self.winner_side().and_then(|side| self.slot(side))
    }

    /// Occupant of the losing side. None when undecided or when the winner had no opponent.
    pub fn loser(&self) -> Option<&Candidate> {
        self.winner_side().and_then(|side| self.slot(side.opposite()))
    }

    /// No candidate in either slot.
    pub fn is_vacant(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Side of the only occupant, when exactly one slot is filled.
    pub fn lone_side(&self) -> Option<Side> {
        match (&self.left, &self.right) {
            (Some(_), None) => Some(Side::Left),
            (None, Some(_)) => Some(Side::Right),
            _ => None,
        }
    }

    /// First free slot, left before right.
    pub fn first_empty_side(&self) -> Option<Side> {
        [Side::Left, Side::Right]
            .into_iter()
            .find(|&side| self.slot(side).is_none())
    }
}

/// Ordered matches of one elimination stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round {
    pub matches: Vec<Match>,
}

impl Round {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    /// True if any match in the round holds a candidate.
    pub fn is_occupied(&self) -> bool {
        self.matches.iter().any(|m| !m.is_vacant())
    }

    pub fn occupied_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| !m.is_vacant())
    }
}
