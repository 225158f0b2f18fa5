//! Release rows as they come out of the catalog.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of release. Only tracks compete for Track of the Year.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseKind {
    #[default]
    Track,
    Album,
}

/// A rated release (track or album).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: Uuid,
    pub slug: String,
    pub artist: String,
    pub title: String,
    pub kind: ReleaseKind,
    pub cover_url: Option<String>,
    /// Official (admin) total, already aggregated from review criteria.
    pub admin_total: Option<f64>,
    /// Average user score.
    pub score: Option<f64>,
    pub votes: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Official total, counting a missing total as zero.
    pub fn official_total(&self) -> f64 {
        self.admin_total.unwrap_or(0.0)
    }

    /// True if the release was added during `year`. Releases without a date never match.
    pub fn added_in(&self, year: i32) -> bool {
        self.created_at.is_some_and(|at| at.year() == year)
    }
}
