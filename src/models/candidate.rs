//! Candidate: one contestant (a track) in the award bracket.

use crate::models::release::Release;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a candidate (same as the release id it came from).
pub type CandidateId = Uuid;

/// A contestant in the bracket. Supplied by the host and never mutated by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub artist: String,
    pub title: String,
    /// Ranking score used for seeding (higher is better).
    pub seed: f64,
}

impl Candidate {
    /// Create a candidate with a fresh id.
    pub fn new(artist: impl Into<String>, title: impl Into<String>, seed: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            artist: artist.into(),
            title: title.into(),
            seed,
        }
    }

    /// Display label, "artist - title".
    pub fn label(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

impl From<&Release> for Candidate {
    fn from(release: &Release) -> Self {
        Self {
            id: release.id,
            artist: release.artist.clone(),
            title: release.title.clone(),
            seed: release.official_total(),
        }
    }
}
