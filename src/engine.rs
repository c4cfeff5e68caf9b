//! The intent surface: every state change goes through `reduce`.
//!
//! A transition runs on a copy of the state. If the logic rejects the intent the
//! copy is dropped and the caller gets the unchanged state back, so each intent is
//! applied atomically or not at all.

use crate::logic::{
    advance_phase, clear_history, load_from_history, load_history, load_state, reset_tournament,
    set_current_player, start_tournament, submit_score, view_next_round, view_previous_round,
};
use crate::models::{HistoryItem, ParticipantId, Phase, ScoreCard, TournamentError, TournamentState};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Something the caller asks the tournament to do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    AddParticipant { name: String },
    BulkAddParticipants { names: Vec<String> },
    RemoveParticipant { participant_id: ParticipantId },
    RenameParticipant { participant_id: ParticipantId, name: String },
    SetStartPhase { phase: Phase },
    SetRoundQuota { phase: Phase, quota: usize },
    StartTournament,
    SetCurrentPlayer { participant_id: Option<ParticipantId> },
    SubmitScore { participant_id: ParticipantId, scores: ScoreCard },
    AdvancePhase,
    ResetTournament,
    LoadState { state: Box<TournamentState> },
    LoadHistory { history: Vec<HistoryItem> },
    ClearHistory,
    ViewPreviousRound,
    ViewNextRound,
    LoadFromHistory { id: String },
}

/// Apply `intent` to `state` in place, reporting why it was rejected.
/// On error `state` may be partially modified; use `reduce` for all-or-nothing.
pub fn apply<R: Rng + ?Sized>(
    state: &mut TournamentState,
    intent: Intent,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<(), TournamentError> {
    match intent {
        Intent::AddParticipant { name } => state.add_participant(&name).map(|_| ()),
        Intent::BulkAddParticipants { names } => state.bulk_add_participants(names.as_slice()).map(|_| ()),
        Intent::RemoveParticipant { participant_id } => state.remove_participant(participant_id),
        Intent::RenameParticipant { participant_id, name } => {
            state.rename_participant(participant_id, &name)
        }
        Intent::SetStartPhase { phase } => state.set_start_phase(phase),
        Intent::SetRoundQuota { phase, quota } => state.set_round_quota(phase, quota),
        Intent::StartTournament => start_tournament(state, rng),
        Intent::SetCurrentPlayer { participant_id } => set_current_player(state, participant_id),
        Intent::SubmitScore { participant_id, scores } => submit_score(state, participant_id, scores),
        Intent::AdvancePhase => advance_phase(state, rng, now),
        Intent::ResetTournament => {
            reset_tournament(state);
            Ok(())
        }
        Intent::LoadState { state: snapshot } => load_state(state, *snapshot),
        Intent::LoadHistory { history } => {
            load_history(state, history);
            Ok(())
        }
        Intent::ClearHistory => {
            clear_history(state);
            Ok(())
        }
        Intent::ViewPreviousRound => view_previous_round(state),
        Intent::ViewNextRound => view_next_round(state),
        Intent::LoadFromHistory { id } => load_from_history(state, &id),
    }
}

/// Next state after `intent`, with explicit randomness and clock. A rejected
/// intent yields an unchanged copy of `state`.
pub fn reduce_with<R: Rng + ?Sized>(
    state: &TournamentState,
    intent: Intent,
    rng: &mut R,
    now: DateTime<Utc>,
) -> TournamentState {
    let mut next = state.clone();
    match apply(&mut next, intent, rng, now) {
        Ok(()) => next,
        Err(e) => {
            log::debug!("Intent ignored: {}", e);
            state.clone()
        }
    }
}

/// Next state after `intent`, shuffling with the thread RNG and stamping with the current time.
pub fn reduce(state: &TournamentState, intent: Intent) -> TournamentState {
    reduce_with(state, intent, &mut rand::thread_rng(), Utc::now())
}
