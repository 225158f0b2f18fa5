//! Lower bracket: lazy loser insertion, deciding matches, finding the lower final.

use crate::logic::grand_final::convene_grand_final;
use crate::logic::require_operator;
use crate::models::{
    Access, BracketError, BracketState, Candidate, LowerFeed, Match, MatchRef, Outcome, Round,
    Side, SlotRef,
};

/// Put `candidate` into lower round `round` and return the slot it landed in.
///
/// Scans the round's undecided matches in creation order and takes the first free slot, left
/// before right. When every match is full (or there are none), a new match is appended with the
/// candidate on the left. Missing rounds are created on the way.
///
/// Records no feed: callers that need re-decisions to find the slot push the `LowerFeed`.
pub(crate) fn place_in_lower_round(
    state: &mut BracketState,
    round: usize,
    candidate: Candidate,
) -> SlotRef {
    ensure_round(state, round);
    let matches = &mut state.lower[round].matches;
    let free = matches.iter().enumerate().find_map(|(index, m)| {
        if m.is_decided() {
            return None;
        }
        m.first_empty_side().map(|side| (index, side))
    });
    let (index, side) = match free {
        Some(found) => found,
        None => {
            matches.push(Match::open(matches.len()));
            (matches.len() - 1, Side::Left)
        }
    };
    log::debug!(
        "{} placed in lower round {} match {} ({:?})",
        candidate.label(),
        round,
        index,
        side
    );
    matches[index].set_slot(side, Some(candidate));
    SlotRef { round, index, side }
}

/// Pick the winner of lower match `index` in round `round`.
///
/// The winner moves to match `index / 2` of the next lower round (left for even `index`, right
/// for odd), unless this match is the lower final. The loser is out of the tournament.
///
/// A lone occupant cannot be advanced while anything that feeds this round is still open; once
/// nothing is, it advances on its own.
pub fn decide_lower_match(
    state: &mut BracketState,
    access: Access,
    round: usize,
    index: usize,
    side: Side,
) -> Result<(), BracketError> {
    require_operator(access, "lower-bracket decision")?;
    let at = MatchRef::lower(round, index);
    let target = state.get_match(at)?;
    if target.slot(side).is_none() {
        return Err(BracketError::EmptySlot(side));
    }
    let previous = target.winner_side();
    let opponent_missing = target.slot(side.opposite()).is_none();
    if previous.is_none() && opponent_missing && !round_closed(state, round) {
        return Err(BracketError::AwaitingOpponent(at));
    }

    match previous {
        Some(current) if current == side => return Ok(()),
        Some(_) => redecide(state, at, side)?,
        None => {
            state.get_match_mut(at)?.outcome = Outcome::Winner(side);
            advance_lower_winner(state, at);
        }
    }

    if let Some(winner) = state.get_match(at)?.winner() {
        log::info!(
            "Lower round {} match {}: {} advances",
            round,
            index,
            winner.label()
        );
    }
    settle_lower_byes(state);
    convene_grand_final(state);
    Ok(())
}

/// Resolve every lone lower occupant that can no longer get an opponent, earliest round first.
/// A resolved bye routes its winner like any other lower match, so later rounds may follow.
pub(crate) fn settle_lower_byes(state: &mut BracketState) {
    let mut round = 0;
    while round < state.lower.len() {
        if round_closed(state, round) {
            let byes: Vec<(usize, Side)> = state.lower[round]
                .matches
                .iter()
                .enumerate()
                .filter(|(_, m)| !m.is_decided())
                .filter_map(|(index, m)| m.lone_side().map(|side| (index, side)))
                .collect();
            for (index, side) in byes {
                let at = MatchRef::lower(round, index);
                log::debug!("Lower round {} match {} is a bye", round, index);
                state.lower[round].matches[index].outcome = Outcome::Winner(side);
                advance_lower_winner(state, at);
            }
        }
        round += 1;
    }
}

/// Nothing can arrive in lower round `round` any more: every upper match up to that round and
/// every occupied lower match before it is decided.
fn round_closed(state: &BracketState, round: usize) -> bool {
    let upper_done = state
        .upper
        .iter()
        .take(round + 1)
        .flat_map(|r| r.matches.iter())
        .all(Match::is_decided);
    upper_done
        && state
            .lower
            .iter()
            .take(round)
            .flat_map(Round::occupied_matches)
            .all(Match::is_decided)
}

/// Slots a replacement for the candidate fed into `to` has to reach.
///
/// Starts at `to` and follows the feeds of holders that were resolved as byes. Fails when the
/// chain runs into a decided match with two entrants.
pub(crate) fn fed_slots(
    state: &BracketState,
    to: SlotRef,
) -> Result<Vec<SlotRef>, BracketError> {
    let mut slots = vec![to];
    let mut holder = MatchRef::lower(to.round, to.index);
    loop {
        let held = state.get_match(holder)?;
        if !held.is_decided() {
            return Ok(slots);
        }
        if held.lone_side().is_none() {
            return Err(BracketError::DownstreamDecided(holder));
        }
        match state.feed_from(holder) {
            Some(feed) => {
                slots.push(feed.to);
                holder = MatchRef::lower(feed.to.round, feed.to.index);
            }
            None => return Ok(slots),
        }
    }
}

/// Put `candidate` into each of `slots` (as returned by `fed_slots`).
pub(crate) fn refill(state: &mut BracketState, slots: &[SlotRef], candidate: &Candidate) {
    for slot in slots {
        if let Some(m) = state
            .lower
            .get_mut(slot.round)
            .and_then(|r| r.matches.get_mut(slot.index))
        {
            m.set_slot(slot.side, Some(candidate.clone()));
        }
    }
}

/// The single occupied match of the last non-empty lower round, once nothing else is pending:
/// every occupied upper match and every occupied earlier lower match is decided.
pub(crate) fn lower_final(state: &BracketState) -> Option<MatchRef> {
    let upper_settled = state.upper.iter().any(Round::is_occupied)
        && state
            .upper
            .iter()
            .flat_map(Round::occupied_matches)
            .all(Match::is_decided);
    if !upper_settled {
        return None;
    }

    let (round, last) = state
        .lower
        .iter()
        .enumerate()
        .rev()
        .find(|(_, r)| r.is_occupied())?;
    let mut occupied = last.matches.iter().enumerate().filter(|(_, m)| !m.is_vacant());
    let (index, _) = occupied.next()?;
    if occupied.next().is_some() {
        return None;
    }

    let lower_settled = state.lower[..round]
        .iter()
        .flat_map(Round::occupied_matches)
        .all(Match::is_decided);
    lower_settled.then(|| MatchRef::lower(round, index))
}

fn ensure_round(state: &mut BracketState, round: usize) {
    while state.lower.len() <= round {
        state.lower.push(Round::default());
    }
}

/// Route the winner of `from` into the next lower round and remember where it went.
fn advance_lower_winner(state: &mut BracketState, from: MatchRef) {
    let Some(winner) = state.get_match(from).ok().and_then(Match::winner).cloned() else {
        return;
    };
    if lower_final(state) == Some(from) {
        log::debug!("Lower round {} match {} is the lower final", from.round, from.index);
        return;
    }
    let to = route_winner(state, from, winner);
    state.lower_feeds.push(LowerFeed { from, to });
}

/// Parity slot of match `from.index / 2` in the next round. If another feed already holds that
/// slot (or the match is decided), fall back to the first-free-slot rule.
fn route_winner(state: &mut BracketState, from: MatchRef, winner: Candidate) -> SlotRef {
    let round = from.round + 1;
    let index = from.index / 2;
    let side = Side::for_source(from.index);
    ensure_round(state, round);

    let free = {
        let matches = &mut state.lower[round].matches;
        while matches.len() <= index {
            matches.push(Match::open(matches.len()));
        }
        let target = &matches[index];
        target.slot(side).is_none() && !target.is_decided()
    };
    if free {
        state.lower[round].matches[index].set_slot(side, Some(winner));
        SlotRef { round, index, side }
    } else {
        log::debug!(
            "Lower round {} match {} {:?} is taken; using first free slot",
            round,
            index,
            side
        );
        place_in_lower_round(state, round, winner)
    }
}

/// Switch an already decided lower match to the other side.
fn redecide(state: &mut BracketState, at: MatchRef, side: Side) -> Result<(), BracketError> {
    let slots = match state.feed_from(at) {
        Some(feed) => fed_slots(state, feed.to)?,
        None => Vec::new(),
    };

    state.get_match_mut(at)?.outcome = Outcome::Winner(side);
    if let Some(winner) = state.get_match(at)?.winner().cloned() {
        refill(state, &slots, &winner);
    }
    Ok(())
}
