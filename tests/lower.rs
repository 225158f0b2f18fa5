//! Integration tests for the lower bracket: lazy insertion and winner routing.

use track_award_web::{
    build_bracket, decide_lower_match, decide_upper_match, Access, BracketError, Candidate,
    MatchRef, Outcome, Side,
};

fn field(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| Candidate::new(format!("Artist {i}"), format!("Track {i}"), 100.0 - i as f64))
        .collect()
}

const OP: Access = Access::Operator;

#[test]
fn lower_winners_follow_parity_rule() {
    let c = field(8);
    let mut b = build_bracket(&c);
    for index in 0..4 {
        decide_upper_match(&mut b, OP, 0, index, Side::Left).unwrap();
    }
    // Lower round 0: (c1, c3), (c5, c7)
    decide_lower_match(&mut b, OP, 0, 1, Side::Right).unwrap();
    decide_lower_match(&mut b, OP, 0, 0, Side::Left).unwrap();

    let next = &b.lower[1].matches;
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].left.as_ref(), Some(&c[1]));
    assert_eq!(next[0].right.as_ref(), Some(&c[7]));
}

#[test]
fn lower_losers_are_eliminated() {
    let c = field(4);
    let mut b = build_bracket(&c);
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 0, 1, Side::Left).unwrap();
    decide_lower_match(&mut b, OP, 0, 0, Side::Left).unwrap();

    let loser = &c[3];
    let later_appearances = b.lower[1..]
        .iter()
        .flat_map(|r| r.matches.iter())
        .filter(|m| m.left.as_ref() == Some(loser) || m.right.as_ref() == Some(loser))
        .count();
    assert_eq!(later_appearances, 0);
}

#[test]
fn taken_parity_slot_falls_back_to_first_free_slot() {
    let c = field(4);
    let mut b = build_bracket(&c);
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 0, 1, Side::Left).unwrap();
    // Upper final loser (c2) reaches lower round 1 first and takes its left slot.
    decide_upper_match(&mut b, OP, 1, 0, Side::Left).unwrap();
    assert_eq!(b.lower[1].matches[0].left.as_ref(), Some(&c[2]));

    decide_lower_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    let m = &b.lower[1].matches[0];
    assert_eq!(m.left.as_ref(), Some(&c[2]));
    assert_eq!(m.right.as_ref(), Some(&c[1]));
    assert_eq!(b.lower[1].matches.len(), 1);
}

#[test]
fn re_deciding_lower_match_replaces_routed_winner() {
    let c = field(8);
    let mut b = build_bracket(&c);
    for index in 0..4 {
        decide_upper_match(&mut b, OP, 0, index, Side::Left).unwrap();
    }
    decide_lower_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    decide_lower_match(&mut b, OP, 0, 0, Side::Right).unwrap();

    assert_eq!(b.lower[1].matches[0].left.as_ref(), Some(&c[3]));
    let feeds: Vec<_> = b
        .lower_feeds
        .iter()
        .filter(|f| f.from == MatchRef::lower(0, 0))
        .collect();
    assert_eq!(feeds.len(), 1);
}

#[test]
fn observer_and_bad_targets_leave_lower_bracket_alone() {
    let mut b = build_bracket(&field(4));
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    let before = b.clone();

    assert_eq!(
        decide_lower_match(&mut b, Access::Observer, 0, 0, Side::Left),
        Err(BracketError::Unauthorized)
    );
    assert_eq!(
        decide_lower_match(&mut b, OP, 0, 0, Side::Right),
        Err(BracketError::EmptySlot(Side::Right))
    );
    assert!(matches!(
        decide_lower_match(&mut b, OP, 0, 5, Side::Left),
        Err(BracketError::MatchOutOfRange { .. })
    ));
    assert_eq!(b, before);
}

#[test]
fn lone_lower_entrant_waits_for_the_rest_of_its_round() {
    let c = field(8);
    let mut b = build_bracket(&c);
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    let before = b.clone();

    assert_eq!(
        decide_lower_match(&mut b, OP, 0, 0, Side::Left),
        Err(BracketError::AwaitingOpponent(MatchRef::lower(0, 0)))
    );
    assert_eq!(b, before);

    for index in 1..4 {
        decide_upper_match(&mut b, OP, 0, index, Side::Left).unwrap();
    }
    // The remaining losers pair up instead of spilling into extra matches.
    let lower0 = &b.lower[0].matches;
    assert_eq!(lower0.len(), 2);
    assert!(lower0.iter().all(|m| m.left.is_some() && m.right.is_some()));
    assert!(lower0.iter().all(|m| !m.is_decided()));
}

#[test]
fn lone_lower_entrant_advances_once_its_round_is_closed() {
    let c = field(6); // lower round 0 gets three losers
    let mut b = build_bracket(&c);
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 0, 1, Side::Left).unwrap();
    assert!(b.lower[0].matches.iter().all(|m| !m.is_decided()));

    decide_upper_match(&mut b, OP, 0, 2, Side::Left).unwrap();
    let bye = &b.lower[0].matches[1];
    assert_eq!(bye.left.as_ref(), Some(&c[5]));
    assert_eq!(bye.outcome, Outcome::Winner(Side::Left));
    assert!(bye.loser().is_none());
    // Match 1 is odd: right slot of match 0 in the next round.
    assert_eq!(b.lower[1].matches[0].right.as_ref(), Some(&c[5]));
    assert!(b
        .lower_feeds
        .iter()
        .any(|f| f.from == MatchRef::lower(0, 1)));

    // Asking for it again changes nothing.
    let before = b.clone();
    decide_lower_match(&mut b, OP, 0, 1, Side::Left).unwrap();
    assert_eq!(b, before);
}
