//! Integration tests for upper-bracket decisions: propagation, loser routing, guards.

use track_award_web::{
    build_bracket, decide_lower_match, decide_upper_match, Access, BracketError, Candidate,
    MatchRef, Outcome, Side, Stage,
};

fn field(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| Candidate::new(format!("Artist {i}"), format!("Track {i}"), 100.0 - i as f64))
        .collect()
}

const OP: Access = Access::Operator;

#[test]
fn winner_goes_to_half_index_and_parity_slot() {
    let c = field(8);
    let mut b = build_bracket(&c);

    decide_upper_match(&mut b, OP, 0, 3, Side::Right).unwrap();
    // 3 is odd: right slot of match 1.
    assert_eq!(b.upper[1].matches[1].right.as_ref(), Some(&c[7]));
    assert!(b.upper[1].matches[1].left.is_none());

    decide_upper_match(&mut b, OP, 0, 2, Side::Left).unwrap();
    // 2 is even: left slot of match 1.
    assert_eq!(b.upper[1].matches[1].left.as_ref(), Some(&c[4]));
    assert_eq!(b.upper[0].matches[2].outcome, Outcome::Winner(Side::Left));
}

#[test]
fn opening_losers_fill_lower_round_zero_in_decision_order() {
    let c = field(8);
    let mut b = build_bracket(&c);

    for index in [3, 0, 2, 1] {
        decide_upper_match(&mut b, OP, 0, index, Side::Left).unwrap();
    }

    let lower0 = &b.lower[0].matches;
    assert_eq!(lower0.len(), 2);
    assert_eq!(lower0[0].left.as_ref(), Some(&c[7]));
    assert_eq!(lower0[0].right.as_ref(), Some(&c[1]));
    assert_eq!(lower0[1].left.as_ref(), Some(&c[5]));
    assert_eq!(lower0[1].right.as_ref(), Some(&c[3]));
    assert!(lower0.iter().all(|m| !m.is_decided()));
    assert_eq!(b.lower_feeds.len(), 4);
    assert_eq!(b.lower_feeds[0].from, MatchRef::upper(0, 3));
}

#[test]
fn observer_cannot_change_anything() {
    let mut b = build_bracket(&field(8));
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    let before = b.clone();

    let result = decide_upper_match(&mut b, Access::from_flag(false), 0, 1, Side::Left);
    assert_eq!(result, Err(BracketError::Unauthorized));
    assert_eq!(b, before);
}

#[test]
fn invalid_targets_are_rejected_without_changes() {
    let mut b = build_bracket(&field(5));
    let before = b.clone();

    assert_eq!(
        decide_upper_match(&mut b, OP, 7, 0, Side::Left),
        Err(BracketError::RoundOutOfRange {
            stage: Stage::Upper,
            round: 7
        })
    );
    assert_eq!(
        decide_upper_match(&mut b, OP, 0, 9, Side::Left),
        Err(BracketError::MatchOutOfRange {
            stage: Stage::Upper,
            round: 0,
            index: 9
        })
    );
    // Bye match has no right occupant.
    assert_eq!(
        decide_upper_match(&mut b, OP, 0, 2, Side::Right),
        Err(BracketError::EmptySlot(Side::Right))
    );
    assert_eq!(b, before);
}

#[test]
fn repeating_a_decision_is_a_no_op() {
    let mut b = build_bracket(&field(4));
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    let after_first = b.clone();
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    assert_eq!(b, after_first);
    assert_eq!(b.lower[0].matches.len(), 1);
}

#[test]
fn re_decision_replaces_winner_and_stale_lower_entry() {
    let c = field(4);
    let mut b = build_bracket(&c);
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 0, 0, Side::Right).unwrap();

    assert_eq!(b.upper[1].matches[0].left.as_ref(), Some(&c[1]));
    let lower0 = &b.lower[0].matches;
    assert_eq!(lower0.len(), 1);
    assert_eq!(lower0[0].left.as_ref(), Some(&c[0]));
    assert!(lower0[0].right.is_none());
    assert_eq!(b.lower_feeds.len(), 1);
}

#[test]
fn re_decision_blocked_once_lower_match_is_decided() {
    let mut b = build_bracket(&field(4));
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 0, 1, Side::Left).unwrap();
    decide_lower_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    let before = b.clone();

    assert_eq!(
        decide_upper_match(&mut b, OP, 0, 0, Side::Right),
        Err(BracketError::DownstreamDecided(MatchRef::lower(0, 0)))
    );
    assert_eq!(b, before);
}

#[test]
fn re_decision_blocked_once_next_upper_match_is_decided() {
    let mut b = build_bracket(&field(4));
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 0, 1, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 1, 0, Side::Left).unwrap();
    let before = b.clone();

    assert_eq!(
        decide_upper_match(&mut b, OP, 0, 1, Side::Right),
        Err(BracketError::DownstreamDecided(MatchRef::upper(1, 0)))
    );
    assert_eq!(b, before);
}

#[test]
fn cannot_advance_before_the_opponent_arrives() {
    let mut b = build_bracket(&field(4));
    decide_upper_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    let before = b.clone();

    assert_eq!(
        decide_upper_match(&mut b, OP, 1, 0, Side::Left),
        Err(BracketError::AwaitingOpponent(MatchRef::upper(1, 0)))
    );
    assert_eq!(b, before);
}

#[test]
fn lone_candidate_without_feeder_advances_automatically() {
    let c = field(6); // 3 -> 2 -> 1; match 1 of round 1 only has a left feeder
    let mut b = build_bracket(&c);
    decide_upper_match(&mut b, OP, 0, 2, Side::Left).unwrap();

    assert_eq!(b.upper[1].matches[1].outcome, Outcome::Winner(Side::Left));
    assert_eq!(b.upper[2].matches[0].right.as_ref(), Some(&c[4]));
    // Only the opening loser went down; the bye has no loser.
    assert_eq!(b.lower_feeds.len(), 1);
    assert_eq!(b.lower[0].matches[0].left.as_ref(), Some(&c[5]));
    assert!(b.lower[1].matches.is_empty());

    let before = b.clone();
    decide_upper_match(&mut b, OP, 1, 1, Side::Left).unwrap();
    assert_eq!(b, before);
}

#[test]
fn re_decision_is_carried_through_an_upper_bye() {
    let c = field(6);
    let mut b = build_bracket(&c);
    decide_upper_match(&mut b, OP, 0, 2, Side::Left).unwrap();
    decide_upper_match(&mut b, OP, 0, 2, Side::Right).unwrap();

    assert_eq!(b.upper[1].matches[1].left.as_ref(), Some(&c[5]));
    assert_eq!(b.upper[1].matches[1].outcome, Outcome::Winner(Side::Left));
    assert_eq!(b.upper[2].matches[0].right.as_ref(), Some(&c[5]));
    assert_eq!(b.lower[0].matches[0].left.as_ref(), Some(&c[4]));
    assert_eq!(b.lower_feeds.len(), 1);
}

#[test]
fn re_decision_is_carried_through_a_lower_bye() {
    let c = field(6);
    let mut b = build_bracket(&c);
    for index in 0..3 {
        decide_upper_match(&mut b, OP, 0, index, Side::Left).unwrap();
    }
    // Lower round 0: (c1, c3) and a bye for c5.
    decide_lower_match(&mut b, OP, 0, 0, Side::Left).unwrap();
    // c2 drops alone into lower round 1 and gets a bye into round 2.
    decide_upper_match(&mut b, OP, 1, 0, Side::Left).unwrap();
    assert_eq!(b.lower[1].matches[1].outcome, Outcome::Winner(Side::Left));
    assert_eq!(b.lower[2].matches[0].right.as_ref(), Some(&c[2]));

    decide_upper_match(&mut b, OP, 1, 0, Side::Right).unwrap();
    assert_eq!(b.upper[2].matches[0].left.as_ref(), Some(&c[2]));
    assert_eq!(b.lower[1].matches[1].left.as_ref(), Some(&c[0]));
    assert_eq!(b.lower[2].matches[0].right.as_ref(), Some(&c[0]));
}
