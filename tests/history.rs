//! Integration tests for round navigation, tournament history, reset and snapshot loading.

use chrono::Utc;
use pasabolo_tournament::{
    can_view_next, can_view_previous, reduce_with, HistoryItem, Intent, Participant, Phase,
    ScoreCard, TournamentState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn step(state: &TournamentState, intent: Intent) -> TournamentState {
    reduce_with(state, intent, &mut StdRng::seed_from_u64(9), Utc::now())
}

fn card(total: u32) -> ScoreCard {
    let mut balls = [0u32; 8];
    balls[0] = total.min(210);
    balls[1] = total - balls[0];
    ScoreCard::new(&balls).unwrap()
}

fn started(n: usize, start: Phase) -> TournamentState {
    let players: Vec<Participant> = (0..n).map(|i| Participant::new(format!("P{i}"))).collect();
    let s = step(&TournamentState::with_participants(players), Intent::SetStartPhase { phase: start });
    step(&s, Intent::StartTournament)
}

/// Score everyone in playing order (strongest last) and advance.
fn play_round(state: &TournamentState) -> TournamentState {
    let mut s = state.clone();
    for (i, p) in state.participants.iter().enumerate() {
        s = step(
            &s,
            Intent::SubmitScore {
                participant_id: p.id,
                scores: card(50 + 10 * i as u32),
            },
        );
    }
    step(&s, Intent::AdvancePhase)
}

fn finished_tournament() -> TournamentState {
    let s = started(2, Phase::Final);
    play_round(&s)
}

fn item(id: &str) -> HistoryItem {
    HistoryItem {
        id: id.to_string(),
        state: TournamentState::new(),
    }
}

#[test]
fn navigation_moves_between_recorded_rounds_only() {
    let s = started(4, Phase::Cuartos);
    assert!(!can_view_previous(&s));
    assert_eq!(step(&s, Intent::ViewPreviousRound), s);
    assert_eq!(step(&s, Intent::ViewNextRound), s);

    let s = play_round(&s);
    assert_eq!(s.phase, Phase::Semifinal);
    assert!(can_view_previous(&s));
    assert!(!can_view_next(&s));

    let back = step(&s, Intent::ViewPreviousRound);
    assert_eq!(back.viewed_phase, Phase::Cuartos);
    assert_eq!(back.phase, Phase::Semifinal);
    assert_eq!(back.rounds, s.rounds);
    // Octavos was never played.
    assert_eq!(step(&back, Intent::ViewPreviousRound), back);

    let forward = step(&back, Intent::ViewNextRound);
    assert_eq!(forward.viewed_phase, Phase::Semifinal);
    assert_eq!(step(&forward, Intent::ViewNextRound), forward);
}

#[test]
fn viewing_history_does_not_block_scoring() {
    let s = play_round(&started(4, Phase::Cuartos));
    let back = step(&s, Intent::ViewPreviousRound);
    let id = back.participants[0].id;
    let scored = step(&back, Intent::SubmitScore { participant_id: id, scores: card(10) });
    assert!(scored.rounds.find(Phase::Semifinal, id).is_some());
    assert_eq!(scored.viewed_phase, Phase::Cuartos);
}

#[test]
fn finishing_archives_and_reset_keeps_history() {
    let done = finished_tournament();
    assert_eq!(done.phase, Phase::Finished);
    assert_eq!(done.history.len(), 1);

    let reset = step(&done, Intent::ResetTournament);
    assert_eq!(reset.phase, Phase::Setup);
    assert!(reset.winner.is_none());
    assert_eq!(reset.history, done.history);
}

#[test]
fn second_tournament_is_prepended() {
    let first = finished_tournament();
    let mut s = step(&first, Intent::ResetTournament);
    s.participants = vec![Participant::new("X"), Participant::new("Y")];
    let s = step(&s, Intent::SetStartPhase { phase: Phase::Final });
    let s = step(&s, Intent::StartTournament);
    let second = play_round(&s);

    assert_eq!(second.history.len(), 2);
    assert_eq!(second.history[1], first.history[0]);
    let winner = second.history[0].state.winner.as_ref().unwrap();
    assert!(winner.name == "X" || winner.name == "Y");
}

#[test]
fn clear_history_empties_list_only() {
    let s = started(3, Phase::Qualification);
    let s = step(&s, Intent::LoadHistory { history: vec![item("a"), item("b")] });
    let cleared = step(&s, Intent::ClearHistory);
    assert!(cleared.history.is_empty());
    assert_eq!(cleared.participants, s.participants);
    assert_eq!(cleared.phase, Phase::Qualification);
}

#[test]
fn load_history_drops_duplicate_ids_and_caps() {
    let mut items = vec![item("a"), item("b"), item("a")];
    items.extend((0..30).map(|i| item(&format!("x{i}"))));
    let s = step(&TournamentState::new(), Intent::LoadHistory { history: items });
    assert_eq!(s.history.len(), 20);
    assert_eq!(s.history[0].id, "a");
    assert_eq!(s.history[1].id, "b");
    assert_eq!(s.history[2].id, "x0");
}

#[test]
fn load_from_history_opens_final_read_only() {
    let done = finished_tournament();
    let id = done.history[0].id.clone();
    let archived = &done.history[0].state;

    let opened = step(&done, Intent::LoadFromHistory { id });
    assert_eq!(opened.phase, Phase::Final);
    assert_eq!(opened.viewed_phase, Phase::Final);
    assert_eq!(opened.winner, archived.winner);
    assert_eq!(opened.rounds, archived.rounds);
    assert_eq!(opened.history, done.history);

    // Archived results cannot be changed or archived again.
    assert_eq!(step(&opened, Intent::AdvancePhase), opened);
    let someone = opened.original_participants[0].id;
    assert_eq!(
        step(&opened, Intent::SubmitScore { participant_id: someone, scores: card(1) }),
        opened
    );
}

#[test]
fn load_from_unknown_history_id_is_a_no_op() {
    let done = finished_tournament();
    let s = step(&done, Intent::LoadFromHistory { id: "missing".into() });
    assert_eq!(s, done);
}

#[test]
fn load_state_keeps_current_history_and_views_active_phase() {
    let with_history = step(&TournamentState::new(), Intent::LoadHistory { history: vec![item("h")] });

    let mut snapshot = play_round(&started(4, Phase::Cuartos));
    snapshot = step(&snapshot, Intent::ViewPreviousRound);
    snapshot.history = vec![item("other")];

    let loaded = step(&with_history, Intent::LoadState { state: Box::new(snapshot.clone()) });
    assert_eq!(loaded.phase, Phase::Semifinal);
    assert_eq!(loaded.viewed_phase, Phase::Semifinal);
    assert_eq!(loaded.rounds, snapshot.rounds);
    assert_eq!(loaded.history, with_history.history);
}

#[test]
fn load_state_rejects_inconsistent_snapshot() {
    let base = TournamentState::new();
    let mut snapshot = started(3, Phase::Qualification);
    snapshot.participants.push(Participant::new("Intruder"));
    assert_eq!(step(&base, Intent::LoadState { state: Box::new(snapshot) }), base);
}

#[test]
fn load_state_rejects_viewed_phase_after_active_phase() {
    let base = TournamentState::new();
    let mut snapshot = started(4, Phase::Cuartos);
    snapshot.viewed_phase = Phase::Final;
    assert_eq!(step(&base, Intent::LoadState { state: Box::new(snapshot) }), base);
}

#[test]
fn load_state_rejects_scores_for_a_phase_not_reached() {
    let base = TournamentState::new();
    let s = started(4, Phase::Cuartos);
    let played = step(
        &s,
        Intent::SubmitScore {
            participant_id: s.participants[0].id,
            scores: card(80),
        },
    );
    let mut raw = serde_json::to_value(&played).unwrap();
    raw["rounds"] = serde_json::json!({ "final": raw["rounds"]["cuartos"].clone() });
    let snapshot: TournamentState = serde_json::from_value(raw).unwrap();
    assert_eq!(step(&base, Intent::LoadState { state: Box::new(snapshot) }), base);
}
