//! Read-only round navigation: move the viewed phase without touching results.

use crate::models::{TournamentError, TournamentState};

/// Step back to the previous phase, if it has recorded scores.
pub fn view_previous_round(state: &mut TournamentState) -> Result<(), TournamentError> {
    let previous = state
        .viewed_phase
        .previous()
        .filter(|&p| state.rounds.has_scores(p))
        .ok_or(TournamentError::NavigationOutOfRange)?;
    state.viewed_phase = previous;
    Ok(())
}

/// Step forward, never past the active phase.
pub fn view_next_round(state: &mut TournamentState) -> Result<(), TournamentError> {
    if state.viewed_phase >= state.phase {
        return Err(TournamentError::NavigationOutOfRange);
    }
    state.viewed_phase = state
        .viewed_phase
        .next()
        .ok_or(TournamentError::NavigationOutOfRange)?;
    Ok(())
}

pub fn can_view_previous(state: &TournamentState) -> bool {
    state
        .viewed_phase
        .previous()
        .is_some_and(|p| state.rounds.has_scores(p))
}

pub fn can_view_next(state: &TournamentState) -> bool {
    state.viewed_phase < state.phase
}
