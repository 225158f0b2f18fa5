//! Upper bracket: deciding matches, pushing winners forward and losers down.

use crate::logic::grand_final::convene_grand_final;
use crate::logic::lower::{fed_slots, place_in_lower_round, refill, settle_lower_byes};
use crate::logic::require_operator;
use crate::models::{
    Access, BracketError, BracketState, LowerFeed, Match, MatchRef, Outcome, Side,
};

/// Pick the winner of upper match `index` in round `round`.
///
/// The winner moves to match `index / 2` of the next round (left slot for even `index`, right
/// for odd). The loser, if there is one, drops into lower round `round`.
///
/// Repeating the current decision is a no-op. Switching sides replaces the downstream upper slot
/// and the lower slot the old loser was put in, as long as neither downstream match is decided.
/// Byes in between do not count as decided: the replacement is carried through them.
pub fn decide_upper_match(
    state: &mut BracketState,
    access: Access,
    round: usize,
    index: usize,
    side: Side,
) -> Result<(), BracketError> {
    require_operator(access, "upper-bracket decision")?;
    let at = MatchRef::upper(round, index);
    let target = state.get_match(at)?;
    if target.slot(side).is_none() {
        return Err(BracketError::EmptySlot(side));
    }
    let previous = target.winner_side();
    let opponent_missing = target.slot(side.opposite()).is_none();
    if previous.is_none() && opponent_missing && has_feeder(state, round, index, side.opposite()) {
        return Err(BracketError::AwaitingOpponent(at));
    }

    match previous {
        Some(current) if current == side => return Ok(()),
        Some(_) => redecide(state, at, side)?,
        None => {
            state.get_match_mut(at)?.outcome = Outcome::Winner(side);
            advance_upper_winner(state, at);
            drop_loser(state, at);
        }
    }

    if let Some(winner) = state.get_match(at)?.winner() {
        log::info!(
            "Upper round {} match {}: {} advances",
            round,
            index,
            winner.label()
        );
    }
    settle_lower_byes(state);
    convene_grand_final(state);
    Ok(())
}

/// Copy the winner of `from` into its slot in the next upper round, overwriting any occupant.
///
/// When that match can never get a second entrant it is a bye: it is resolved for the occupant
/// and the winner keeps moving forward.
pub(crate) fn advance_upper_winner(state: &mut BracketState, from: MatchRef) {
    let Some(winner) = state.get_match(from).ok().and_then(Match::winner).cloned() else {
        return;
    };
    let to = next_upper(from);
    let Ok(target) = state.get_match_mut(to) else {
        return;
    };
    target.set_slot(Side::for_source(from.index), Some(winner));

    if let Some(side) = upper_bye_side(state, to) {
        if let Ok(bye) = state.get_match_mut(to) {
            bye.outcome = Outcome::Winner(side);
        }
        log::debug!("Upper round {} match {} is a bye", to.round, to.index);
        advance_upper_winner(state, to);
    }
}

fn next_upper(from: MatchRef) -> MatchRef {
    MatchRef::upper(from.round + 1, from.index / 2)
}

/// Side of the lone occupant of upper match `at`, if its other slot has no feeder at all.
fn upper_bye_side(state: &BracketState, at: MatchRef) -> Option<Side> {
    let side = state.get_match(at).ok()?.lone_side()?;
    (!has_feeder(state, at.round, at.index, side.opposite())).then_some(side)
}

/// Send the loser of `from` to the lower bracket and remember where it went.
fn drop_loser(state: &mut BracketState, from: MatchRef) {
    let Some(loser) = state.get_match(from).ok().and_then(Match::loser).cloned() else {
        return;
    };
    let to = place_in_lower_round(state, from.round, loser);
    state.lower_feeds.push(LowerFeed { from, to });
}

/// Switch an already decided match to the other side.
fn redecide(state: &mut BracketState, at: MatchRef, side: Side) -> Result<(), BracketError> {
    let mut next = next_upper(at);
    while upper_bye_side(state, next).is_some() {
        next = next_upper(next);
    }
    if state.get_match(next).is_ok_and(Match::is_decided) {
        return Err(BracketError::DownstreamDecided(next));
    }
    let feed = state.feed_from(at).copied();
    let slots = match feed {
        Some(feed) => fed_slots(state, feed.to)?,
        None => Vec::new(),
    };

    state.get_match_mut(at)?.outcome = Outcome::Winner(side);
    advance_upper_winner(state, at);
    match feed {
        Some(feed) => {
            if let Some(loser) = state.get_match(at)?.loser().cloned() {
                refill(state, &slots, &loser);
            }
            log::info!(
                "Upper round {} match {} re-decided; lower round {} match {} updated",
                at.round,
                at.index,
                feed.to.round,
                feed.to.index
            );
        }
        None => drop_loser(state, at),
    }
    Ok(())
}

/// True if slot `side` of upper match (`round`, `index`) is fed by a match of the previous round.
/// Every upper match eventually holds a candidate, so a feeder always delivers one.
fn has_feeder(state: &BracketState, round: usize, index: usize, side: Side) -> bool {
    let Some(previous) = round.checked_sub(1).and_then(|r| state.upper.get(r)) else {
        return false;
    };
    let source = index * 2 + usize::from(side == Side::Right);
    source < previous.matches.len()
}
