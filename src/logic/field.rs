//! Field selection: turn the release catalog into a ranked, deduplicated list of candidates.

use crate::models::{Candidate, Release, ReleaseKind};
use std::collections::HashSet;

/// Tracks that make it into the Track of the Year bracket.
pub const DEFAULT_FIELD_SIZE: usize = 32;

/// Which releases form the field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldOptions {
    pub kind: ReleaseKind,
    /// Only releases added in this year. `None` keeps every year.
    pub year: Option<i32>,
    pub size: usize,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            kind: ReleaseKind::Track,
            year: None,
            size: DEFAULT_FIELD_SIZE,
        }
    }
}

/// Releases of one kind, best official total first. Ties keep catalog order.
pub fn rank_releases(releases: &[Release], kind: ReleaseKind) -> Vec<&Release> {
    let mut ranked: Vec<&Release> = releases.iter().filter(|r| r.kind == kind).collect();
    ranked.sort_by(|a, b| b.official_total().total_cmp(&a.official_total()));
    ranked
}

/// Ranked field for a new bracket: filter by kind and year, drop repeated ids, keep the top `size`.
pub fn select_field(releases: &[Release], options: &FieldOptions) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    rank_releases(releases, options.kind)
        .into_iter()
        .filter(|r| options.year.map_or(true, |year| r.added_in(year)))
        .filter(|r| seen.insert(r.id))
        .take(options.size)
        .map(Candidate::from)
        .collect()
}
