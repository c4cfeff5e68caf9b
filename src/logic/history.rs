//! Finished-tournament history, reset, and loading external snapshots.

use crate::logic::scoring::next_unscored;
use crate::models::{HistoryItem, Phase, TournamentError, TournamentState, HISTORY_LIMIT};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// History id of a finished tournament: finish time (ms) and the first registered participant.
pub fn history_id(finished: &TournamentState, now: DateTime<Utc>) -> String {
    let first = finished
        .original_participants
        .first()
        .map(|p| p.id.to_string())
        .unwrap_or_else(|| "0".to_string());
    format!("{}-{}", now.timestamp_millis(), first)
}

/// Prepend a finished tournament to `history` unless an item with the same id is
/// already there (double dispatch). Keeps the newest `HISTORY_LIMIT` items.
pub fn archive(mut history: Vec<HistoryItem>, finished: TournamentState, now: DateTime<Utc>) -> Vec<HistoryItem> {
    let id = history_id(&finished, now);
    if history.iter().any(|item| item.id == id) {
        log::debug!("History already holds {}, not archiving again", id);
        return history;
    }
    history.insert(0, HistoryItem { id, state: finished });
    history.truncate(HISTORY_LIMIT);
    history
}

/// Drop items whose id was already seen (first occurrence wins) and cap the list.
pub fn dedup_history(items: Vec<HistoryItem>) -> Vec<HistoryItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .take(HISTORY_LIMIT)
        .collect()
}

/// Replace the history list (e.g. read back from storage).
pub fn load_history(state: &mut TournamentState, items: Vec<HistoryItem>) {
    state.history = dedup_history(items);
}

pub fn clear_history(state: &mut TournamentState) {
    state.history.clear();
}

/// Discard the live tournament, keeping history.
pub fn reset_tournament(state: &mut TournamentState) {
    let history = std::mem::take(&mut state.history);
    *state = TournamentState {
        history,
        ..TournamentState::new()
    };
}

/// Open a finished tournament for inspection. It is reported at the final so its
/// rounds can be browsed; the current history list is kept as is.
pub fn load_from_history(state: &mut TournamentState, id: &str) -> Result<(), TournamentError> {
    let item = state
        .history
        .iter()
        .find(|item| item.id == id)
        .ok_or_else(|| TournamentError::HistoryItemNotFound(id.to_string()))?;
    let mut snapshot = item.state.clone();
    if snapshot.phase == Phase::Finished {
        snapshot.phase = Phase::Final;
    }
    snapshot.viewed_phase = snapshot.phase;
    snapshot.current_player_id = None;
    snapshot.history = std::mem::take(&mut state.history);
    *state = snapshot;
    Ok(())
}

/// Replace the live tournament with an external snapshot, keeping the current
/// history. The snapshot must satisfy the state invariants as given; once
/// accepted it is viewed at its active phase and a stale turn pointer is moved
/// to the next unscored participant.
pub fn load_state(state: &mut TournamentState, snapshot: TournamentState) -> Result<(), TournamentError> {
    let mut snapshot = TournamentState {
        history: Vec::new(),
        ..snapshot
    };
    snapshot.validate()?;
    snapshot.viewed_phase = snapshot.phase;
    if let Some(id) = snapshot.current_player_id {
        let on_roster = snapshot.participants.iter().any(|p| p.id == id);
        if !on_roster || snapshot.rounds.find(snapshot.phase, id).is_some() {
            snapshot.current_player_id = next_unscored(&snapshot);
        }
    }
    snapshot.history = std::mem::take(&mut state.history);
    *state = snapshot;
    Ok(())
}
