//! Integration tests for score submission, score cards and turn order.

use chrono::Utc;
use pasabolo_tournament::{
    autocomplete_round, next_unscored, reduce_with, round_complete, submit_score, Intent,
    KnockoutScoreRecord, Participant, Phase, ScoreCard, ScoreEntry, TournamentError, TournamentState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn step(state: &TournamentState, intent: Intent) -> TournamentState {
    reduce_with(state, intent, &mut StdRng::seed_from_u64(11), Utc::now())
}

/// A valid card adding up to `total` (front-loaded, 210 per ball at most).
fn card(total: u32) -> ScoreCard {
    let mut left = total;
    let balls: Vec<u32> = (0..8)
        .map(|_| {
            let ball = left.min(210);
            left -= ball;
            ball
        })
        .collect();
    ScoreCard::new(&balls).unwrap()
}

fn started(n: usize, start: Phase) -> TournamentState {
    let players: Vec<Participant> = (0..n).map(|i| Participant::new(format!("P{i}"))).collect();
    let s = TournamentState::with_participants(players);
    let s = step(&s, Intent::SetStartPhase { phase: start });
    step(&s, Intent::StartTournament)
}

fn submit(state: &TournamentState, idx: usize, total: u32) -> TournamentState {
    step(
        state,
        Intent::SubmitScore {
            participant_id: state.participants[idx].id,
            scores: card(total),
        },
    )
}

#[test]
fn total_is_sum_of_balls() {
    let s = started(2, Phase::Qualification);
    let id = s.participants[0].id;
    let scores = ScoreCard::new(&[10, 20, 30, 40, 50, 60, 70, 80]).unwrap();
    let s = step(&s, Intent::SubmitScore { participant_id: id, scores });
    let entry = s.rounds.find(Phase::Qualification, id).unwrap();
    assert_eq!(entry.total(), 360);
    assert!(matches!(entry, ScoreEntry::Plain(r) if r.total == 360));
}

#[test]
fn score_card_rejects_wrong_shape() {
    assert!(matches!(
        ScoreCard::new(&[1, 2, 3, 4, 5, 6, 7]),
        Err(TournamentError::InvalidScores { .. })
    ));
    assert!(matches!(
        ScoreCard::new(&[0, 0, 0, 0, 0, 0, 0, 211]),
        Err(TournamentError::InvalidScores { .. })
    ));
    assert_eq!(ScoreCard::new(&[210; 8]).unwrap().total(), 1680);

    let from_json: Result<ScoreCard, _> = serde_json::from_str("[1,2,3,4,5,6,7,300]");
    assert!(from_json.is_err());
    let ok: ScoreCard = serde_json::from_str("[1,2,3,4,5,6,7,8]").unwrap();
    assert_eq!(ok.balls(), &[1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn duplicate_submission_is_a_no_op() {
    let s = started(3, Phase::Qualification);
    let s = submit(&s, 0, 100);
    let again = submit(&s, 0, 500);
    assert_eq!(again, s);
    assert_eq!(again.rounds.entries(Phase::Qualification).len(), 1);
    assert_eq!(again.rounds.entries(Phase::Qualification)[0].total(), 100);
}

#[test]
fn submit_rejects_participant_outside_roster() {
    let mut s = started(3, Phase::Qualification);
    let stranger = Participant::new("Stranger").id;
    assert_eq!(
        submit_score(&mut s, stranger, card(10)),
        Err(TournamentError::ParticipantNotFound(stranger))
    );
}

#[test]
fn submit_rejected_outside_scored_phase() {
    let mut s = TournamentState::with_participants(vec![Participant::new("A")]);
    let id = s.participants[0].id;
    assert_eq!(submit_score(&mut s, id, card(10)), Err(TournamentError::InvalidState));
}

#[test]
fn knockout_record_saturates_instead_of_overflowing() {
    let id = Participant::new("A").id;
    let record = KnockoutScoreRecord::new(id, card(7), u32::MAX);
    assert_eq!(record.accumulated_total, u32::MAX);
    assert!(!record.is_consistent());
    assert!(KnockoutScoreRecord::new(id, card(7), 100).is_consistent());
}

#[test]
fn knockout_without_prior_round_starts_from_zero() {
    let s = started(4, Phase::Cuartos);
    let id = s.participants[0].id;
    let s = submit(&s, 0, 120);
    match s.rounds.find(Phase::Cuartos, id).unwrap() {
        ScoreEntry::Knockout(r) => {
            assert_eq!(r.previous_round_total, 0);
            assert_eq!(r.accumulated_total, 120);
        }
        other => panic!("expected knockout record, got {other:?}"),
    }
}

#[test]
fn knockout_carries_previous_effective_total() {
    let s = started(3, Phase::Qualification);
    let s = submit(&s, 0, 300);
    let s = submit(&s, 1, 200);
    let s = submit(&s, 2, 100);
    let s = step(&s, Intent::AdvancePhase);
    assert_eq!(s.phase, Phase::Octavos);
    assert_eq!(s.participants.len(), 3);

    let mut s = s;
    for i in 0..3 {
        s = submit(&s, i, 50);
    }
    for entry in s.rounds.entries(Phase::Octavos) {
        let prev = s
            .rounds
            .find(Phase::Qualification, entry.participant_id())
            .unwrap()
            .effective_total();
        match entry {
            ScoreEntry::Knockout(r) => {
                assert_eq!(r.previous_round_total, prev);
                assert_eq!(r.accumulated_total, r.previous_round_total + r.total);
            }
            other => panic!("expected knockout record, got {other:?}"),
        }
    }
}

#[test]
fn octavos_opening_the_bracket_records_plain_scores() {
    let s = started(4, Phase::Octavos);
    let id = s.participants[0].id;
    let s = submit(&s, 0, 80);
    assert!(matches!(s.rounds.find(Phase::Octavos, id), Some(ScoreEntry::Plain(_))));
}

#[test]
fn current_player_must_be_unscored_roster_member() {
    let s = started(3, Phase::Qualification);
    let scored = s.participants[0].id;
    let waiting = s.participants[1].id;
    let s = submit(&s, 0, 10);

    assert_eq!(
        step(&s, Intent::SetCurrentPlayer { participant_id: Some(scored) }),
        s
    );
    let moved = step(&s, Intent::SetCurrentPlayer { participant_id: Some(waiting) });
    assert_eq!(moved.current_player_id, Some(waiting));
    let cleared = step(&moved, Intent::SetCurrentPlayer { participant_id: None });
    assert_eq!(cleared.current_player_id, None);
}

#[test]
fn submit_does_not_move_the_turn() {
    let s = started(3, Phase::Qualification);
    let first = s.current_player_id;
    let s = submit(&s, 0, 10);
    assert_eq!(s.current_player_id, first);
    assert_eq!(next_unscored(&s), Some(s.participants[1].id));
}

#[test]
fn next_unscored_follows_playing_order() {
    let s = started(3, Phase::Qualification);
    let s = submit(&s, 1, 10);
    assert_eq!(next_unscored(&s), Some(s.participants[0].id));
    let s = submit(&s, 0, 10);
    assert_eq!(next_unscored(&s), Some(s.participants[2].id));
    assert!(!round_complete(&s));
    let s = submit(&s, 2, 10);
    assert_eq!(next_unscored(&s), None);
    assert!(round_complete(&s));
}

#[test]
fn autocomplete_fills_the_round() {
    let s = started(5, Phase::Qualification);
    let s = submit(&s, 2, 40);
    let intents = autocomplete_round(&s, &mut StdRng::seed_from_u64(3));
    assert_eq!(intents.len(), 5);
    assert_eq!(intents.last(), Some(&Intent::SetCurrentPlayer { participant_id: None }));

    let mut s = s;
    for intent in intents {
        if let Intent::SubmitScore { scores, .. } = &intent {
            assert!(scores.balls().iter().all(|&b| b <= 26));
        }
        s = step(&s, intent);
    }
    assert!(round_complete(&s));
    assert_eq!(s.current_player_id, None);
    assert_eq!(s.rounds.entries(Phase::Qualification).len(), 5);
}
