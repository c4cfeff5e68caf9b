//! Score submission and turn order within the active phase.

use crate::models::{
    KnockoutScoreRecord, ParticipantId, ScoreCard, ScoreEntry, ScoreRecord, TournamentError,
    TournamentState, BALLS_PER_ROUND, MAX_BALL_SCORE,
};
use crate::Intent;
use rand::Rng;

/// Highest random ball when autocompleting a round.
const AUTOCOMPLETE_BALL_MAX: u32 = MAX_BALL_SCORE / BALLS_PER_ROUND as u32;

fn ensure_playable(state: &TournamentState) -> Result<(), TournamentError> {
    if !state.phase.is_scored() || state.is_archived() {
        return Err(TournamentError::InvalidState);
    }
    Ok(())
}

/// Record one participant's score card in the active phase.
///
/// The bracket-opening phase stores a plain record. Every later phase stores a
/// knockout record carrying the participant's effective total from the phase
/// immediately before (0 if they have no record there). A second submission for
/// the same participant and phase is rejected.
pub fn submit_score(
    state: &mut TournamentState,
    participant_id: ParticipantId,
    scores: ScoreCard,
) -> Result<(), TournamentError> {
    ensure_playable(state)?;
    let phase = state.phase;
    if state.rounds.find(phase, participant_id).is_some() {
        return Err(TournamentError::AlreadyScored { phase, participant_id });
    }
    if !state.participants.iter().any(|p| p.id == participant_id) {
        return Err(TournamentError::ParticipantNotFound(participant_id));
    }

    let entry = if phase.opens_bracket(state.config.start_phase) {
        ScoreEntry::Plain(ScoreRecord::new(participant_id, scores))
    } else {
        let previous_round_total = phase
            .previous()
            .and_then(|prev| state.rounds.find(prev, participant_id))
            .map(ScoreEntry::effective_total)
            .unwrap_or(0);
        ScoreEntry::Knockout(KnockoutScoreRecord::new(participant_id, scores, previous_round_total))
    };
    log::debug!(
        "Recorded {} for participant {} in {}",
        entry.total(),
        participant_id,
        phase
    );
    state.rounds.record(phase, entry);
    Ok(())
}

/// Set whose turn it is. Must be `None` or a roster participant not yet scored in the active phase.
pub fn set_current_player(
    state: &mut TournamentState,
    participant_id: Option<ParticipantId>,
) -> Result<(), TournamentError> {
    if let Some(id) = participant_id {
        ensure_playable(state)?;
        if !state.participants.iter().any(|p| p.id == id) {
            return Err(TournamentError::ParticipantNotFound(id));
        }
        if state.rounds.find(state.phase, id).is_some() {
            return Err(TournamentError::AlreadyScored {
                phase: state.phase,
                participant_id: id,
            });
        }
    }
    state.current_player_id = participant_id;
    Ok(())
}

/// First roster participant (in playing order) without a score in the active phase.
pub fn next_unscored(state: &TournamentState) -> Option<ParticipantId> {
    if !state.phase.is_scored() {
        return None;
    }
    state
        .participants
        .iter()
        .map(|p| p.id)
        .find(|&id| state.rounds.find(state.phase, id).is_none())
}

/// Every participant of the active phase has a score.
pub fn round_complete(state: &TournamentState) -> bool {
    state.phase.is_scored() && next_unscored(state).is_none()
}

/// Intents that fill the active round with random score cards, in playing order,
/// then clear the current player. Meant for trying a bracket out end to end.
pub fn autocomplete_round<R: Rng + ?Sized>(state: &TournamentState, rng: &mut R) -> Vec<Intent> {
    if !state.phase.is_scored() || state.is_archived() {
        return Vec::new();
    }
    let mut intents: Vec<Intent> = state
        .participants
        .iter()
        .filter(|p| state.rounds.find(state.phase, p.id).is_none())
        .filter_map(|p| {
            let balls: Vec<u32> = (0..BALLS_PER_ROUND)
                .map(|_| rng.gen_range(0..=AUTOCOMPLETE_BALL_MAX))
                .collect();
            ScoreCard::new(&balls).ok().map(|scores| Intent::SubmitScore {
                participant_id: p.id,
                scores,
            })
        })
        .collect();
    if !intents.is_empty() {
        intents.push(Intent::SetCurrentPlayer { participant_id: None });
    }
    intents
}
