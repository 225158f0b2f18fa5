//! Track of the Year award: library with models, bracket logic and the release catalog.

pub mod catalog;
pub mod logic;
pub mod models;

pub use catalog::{load_catalog, read_catalog, CatalogError};
pub use logic::{
    build_bracket, convene_grand_final, decide_grand_final, decide_lower_match, decide_upper_match,
    derive_placements, rank_releases, select_field, FieldOptions, DEFAULT_FIELD_SIZE,
};
pub use models::{
    Access, BracketError, BracketState, Candidate, CandidateId, LowerFeed, Match, MatchRef,
    Outcome, Placements, Release, ReleaseKind, Round, Side, SlotRef, Stage,
};
