//! Grand final: convened between the upper and lower champions, decided on its own.

use crate::logic::lower::lower_final;
use crate::logic::require_operator;
use crate::models::{Access, BracketError, BracketState, Candidate, Match, Outcome, Side};

/// Winner of the upper final (the single match of the last upper round).
pub(crate) fn upper_champion(state: &BracketState) -> Option<&Candidate> {
    match state.upper.last()?.matches.as_slice() {
        [only] => only.winner(),
        _ => None,
    }
}

/// Winner of the lower final, once it is decided.
pub(crate) fn lower_champion(state: &BracketState) -> Option<&Candidate> {
    let at = lower_final(state)?;
    state.get_match(at).ok()?.winner()
}

/// Create or refresh the grand final once both champions are known.
///
/// Same pair as before: left untouched (its decision is kept). Different pair: replaced, and
/// any decision on the old one is discarded. Champions not known yet: nothing happens.
pub fn convene_grand_final(state: &mut BracketState) {
    let (Some(upper), Some(lower)) = (
        upper_champion(state).cloned(),
        lower_champion(state).cloned(),
    ) else {
        return;
    };

    if let Some(existing) = &state.grand_final {
        let same_left = existing.left.as_ref().map(|c| c.id) == Some(upper.id);
        let same_right = existing.right.as_ref().map(|c| c.id) == Some(lower.id);
        if same_left && same_right {
            return;
        }
        log::info!("Bracket champions changed; replacing the grand final");
    }

    log::info!(
        "Grand final convened: {} vs {}",
        upper.label(),
        lower.label()
    );
    state.grand_final = Some(Match::seeded(0, Some(upper), Some(lower)));
}

/// Pick the grand final winner. Nothing propagates from here.
pub fn decide_grand_final(
    state: &mut BracketState,
    access: Access,
    side: Side,
) -> Result<(), BracketError> {
    require_operator(access, "grand final decision")?;
    let grand_final = state
        .grand_final
        .as_mut()
        .ok_or(BracketError::GrandFinalNotConvened)?;
    if grand_final.slot(side).is_none() {
        return Err(BracketError::EmptySlot(side));
    }
    grand_final.outcome = Outcome::Winner(side);
    if let Some(winner) = grand_final.winner() {
        log::info!("Grand final: {} wins", winner.label());
    }
    Ok(())
}
