//! Standings derived from the current bracket (never stored).

use crate::logic::grand_final::lower_champion;
use crate::models::{BracketState, Candidate, Match, Placements, Round};

/// Compute 1st-5th from the bracket.
///
/// - 1st / 2nd: grand final winner and loser.
/// - 3rd: loser of the lower final.
/// - 4th / 5th: losers of the lower round before the final round, higher seed first, then field
///   order.
///
/// 3rd-5th are only reported once the lower final is decided. Anything not determined is `None`.
pub fn derive_placements(state: &BracketState) -> Placements {
    let mut placements = Placements::default();

    if let Some(grand_final) = &state.grand_final {
        placements.first = grand_final.winner().cloned();
        placements.second = grand_final.loser().cloned();
    }

    if lower_champion(state).is_none() {
        return placements;
    }

    let occupied: Vec<&Round> = state.lower.iter().filter(|r| r.is_occupied()).collect();
    if let Some(last) = occupied.last() {
        let mut deciding = last.occupied_matches();
        if let (Some(only), None) = (deciding.next(), deciding.next()) {
            placements.third = only.loser().cloned();
        }
    }

    if let Some(semi) = occupied.len().checked_sub(2).map(|i| occupied[i]) {
        if semi.occupied_matches().count() <= 2 {
            let mut losers: Vec<&Candidate> =
                semi.occupied_matches().filter_map(Match::loser).collect();
            losers.sort_by(|a, b| {
                b.seed
                    .total_cmp(&a.seed)
                    .then_with(|| state.field_position(a).cmp(&state.field_position(b)))
            });
            let mut losers = losers.into_iter().cloned();
            placements.fourth = losers.next();
            placements.fifth = losers.next();
        }
    }

    placements
}
