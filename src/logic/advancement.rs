//! Phase advancement: ranking, selecting advancers, crowning the winner.

use crate::logic::history::archive;
use crate::models::{
    Participant, ParticipantId, Phase, ScoreCard, ScoreEntry, TournamentError, TournamentState,
};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// One row of a round's results table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Standing {
    /// 1-based position by effective total.
    pub rank: usize,
    pub participant_id: ParticipantId,
    pub name: String,
    pub total: u32,
    pub effective_total: u32,
    pub scores: ScoreCard,
    /// Inside the next phase's advancement quota (the top entry only, in the final).
    pub advances: bool,
}

/// Entries of `phase` by effective total, highest first. Ties keep submission order.
pub fn ranked(state: &TournamentState, phase: Phase) -> Vec<&ScoreEntry> {
    let mut entries: Vec<&ScoreEntry> = state.rounds.entries(phase).iter().collect();
    entries.sort_by(|a, b| b.effective_total().cmp(&a.effective_total()));
    entries
}

/// How many leave `phase` for the next one (1 out of the final).
fn advancing_count(state: &TournamentState, phase: Phase) -> usize {
    match phase {
        Phase::Final => 1,
        _ => phase.next().map(|next| state.config.quota(next)).unwrap_or(0),
    }
}

/// Results table for `phase`, for display.
pub fn standings(state: &TournamentState, phase: Phase) -> Vec<Standing> {
    let cutoff = advancing_count(state, phase);
    ranked(state, phase)
        .into_iter()
        .enumerate()
        .map(|(i, entry)| Standing {
            rank: i + 1,
            participant_id: entry.participant_id(),
            name: state
                .participant(entry.participant_id())
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            total: entry.total(),
            effective_total: entry.effective_total(),
            scores: *entry.scores(),
            advances: i < cutoff,
        })
        .collect()
}

/// Advance out of the active phase once everyone on the roster has a score.
///
/// From the final this crowns the winner, archives the finished tournament into
/// history and leaves an empty tournament reported as Finished. From any other
/// phase the top `quota(next phase)` participants advance: re-drawn at random out
/// of the bracket-opening phase, otherwise weakest first.
pub fn advance_phase<R: Rng + ?Sized>(
    state: &mut TournamentState,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<(), TournamentError> {
    if !state.phase.is_scored() || state.is_archived() {
        return Err(TournamentError::InvalidState);
    }
    if state
        .participants
        .iter()
        .any(|p| state.rounds.find(state.phase, p.id).is_none())
    {
        return Err(TournamentError::IncompleteResults);
    }

    if state.phase == Phase::Final {
        return finish_tournament(state, now);
    }

    let phase = state.phase;
    let next = phase.next().ok_or(TournamentError::InvalidState)?;
    let quota = state.config.quota(next);

    let mut advancing: Vec<&ScoreEntry> = ranked(state, phase).into_iter().take(quota).collect();
    let reshuffle = phase.opens_bracket(state.config.start_phase);
    if !reshuffle {
        // Stable: equal totals keep their ranking order.
        advancing.sort_by_key(|e| e.effective_total());
    }
    let mut next_players: Vec<Participant> = advancing
        .iter()
        .filter_map(|e| {
            state
                .original_participants
                .iter()
                .find(|p| p.id == e.participant_id())
                .cloned()
        })
        .collect();
    if reshuffle {
        next_players.shuffle(rng);
    }

    log::info!(
        "{} complete: {} of {} advance to {}",
        phase,
        next_players.len(),
        state.rounds.entries(phase).len(),
        next
    );
    state.current_player_id = next_players.first().map(|p| p.id);
    state.participants = next_players;
    state.phase = next;
    state.viewed_phase = next;
    Ok(())
}

/// Crown the final's top scorer, archive the finished tournament and reset the live state.
fn finish_tournament(state: &mut TournamentState, now: DateTime<Utc>) -> Result<(), TournamentError> {
    let top = ranked(state, Phase::Final)
        .first()
        .map(|e| e.participant_id())
        .ok_or(TournamentError::NoFinalScores)?;
    let winner = state
        .original_participants
        .iter()
        .find(|p| p.id == top)
        .cloned()
        .ok_or(TournamentError::ParticipantNotFound(top))?;

    let mut finished = state.without_history();
    finished.phase = Phase::Finished;
    finished.winner = Some(winner.clone());
    finished.finished_at = Some(now);
    log::info!("Tournament finished, winner: {}", winner.name);

    let history = archive(std::mem::take(&mut state.history), finished, now);
    *state = TournamentState {
        phase: Phase::Finished,
        viewed_phase: Phase::Finished,
        winner: Some(winner),
        history,
        ..TournamentState::new()
    };
    Ok(())
}
