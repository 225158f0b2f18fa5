//! Bracket construction: seed the opening round, pre-allocate the upper ladder, reserve lower rounds.

use crate::logic::grand_final::convene_grand_final;
use crate::logic::lower::settle_lower_byes;
use crate::logic::upper::advance_upper_winner;
use crate::models::{BracketState, Candidate, Match, MatchRef, Round};

/// Build a fresh bracket from a ranked field.
///
/// 1. Pair candidates in the given order: (0,1) is match 0, (2,3) is match 1, ...
///    An odd trailing candidate gets a bye.
/// 2. Add empty upper rounds, each with ceil(previous / 2) matches, until a single match remains.
/// 3. Reserve one (empty) lower round per upper round.
/// 4. Push opening byes into round 1 as if they had been decided. A later match that can only
///    ever get one entrant is a bye too, so the same candidate may move several rounds ahead.
///
/// An empty field yields one empty upper round and one empty lower round.
pub fn build_bracket(candidates: &[Candidate]) -> BracketState {
    let opening: Vec<Match> = candidates
        .chunks(2)
        .enumerate()
        .map(|(id, pair)| Match::seeded(id, pair.first().cloned(), pair.get(1).cloned()))
        .collect();

    let mut count = opening.len();
    let mut upper = vec![Round::new(opening)];
    while count > 1 {
        count = count.div_ceil(2);
        upper.push(Round::new((0..count).map(Match::open).collect()));
    }
    let lower = vec![Round::default(); upper.len()];

    let mut state = BracketState {
        field: candidates.to_vec(),
        upper,
        lower,
        grand_final: None,
        lower_feeds: Vec::new(),
    };

    let byes: Vec<usize> = state.upper[0]
        .matches
        .iter()
        .filter(|m| m.is_decided())
        .map(|m| m.id)
        .collect();
    for index in byes {
        log::debug!("Opening match {} is a bye", index);
        advance_upper_winner(&mut state, MatchRef::upper(0, index));
    }
    settle_lower_byes(&mut state);
    convene_grand_final(&mut state);

    log::info!(
        "Built bracket: {} candidates, {} upper rounds",
        state.field.len(),
        state.upper.len()
    );
    state
}
