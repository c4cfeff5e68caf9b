//! Setup phase: roster import and starting the tournament (Setup -> start phase).

use crate::models::{Phase, TournamentError, TournamentState, MIN_PARTICIPANTS};
use rand::seq::SliceRandom;
use rand::Rng;

/// Split pasted text into participant names: one or more per line, separated by
/// newlines or commas, double-quoted names allowed. Blank fields are dropped;
/// duplicates are left for the bulk-add rule to handle.
pub fn parse_roster(text: &str) -> Result<Vec<String>, TournamentError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut names = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TournamentError::RosterImport(e.to_string()))?;
        names.extend(record.iter().filter(|f| !f.is_empty()).map(str::to_string));
    }
    Ok(names)
}

/// Start the tournament: snapshot the roster, cap it to the start phase's quota
/// when resuming past qualification, and shuffle the playing order. Every phase
/// after the start needs a nonzero quota.
pub fn start_tournament<R: Rng + ?Sized>(state: &mut TournamentState, rng: &mut R) -> Result<(), TournamentError> {
    if state.phase != Phase::Setup {
        return Err(TournamentError::InvalidState);
    }
    if state.participants.len() < MIN_PARTICIPANTS {
        return Err(TournamentError::NotEnoughPlayersToStart {
            required: MIN_PARTICIPANTS,
        });
    }
    let start = state.config.start_phase;
    if !start.is_scored() {
        return Err(TournamentError::NotAScoredPhase(start));
    }
    // The start phase may have moved since the quotas were set.
    if let Some(empty) = Phase::SCORED
        .iter()
        .copied()
        .find(|&phase| phase > start && state.config.quota(phase) == 0)
    {
        return Err(TournamentError::EmptyQuota(empty));
    }

    state.original_participants = state.participants.clone();
    let mut first_round = std::mem::take(&mut state.participants);
    if start != Phase::Qualification {
        // A zero quota means "everyone".
        let quota = state.config.quota(start);
        if quota > 0 {
            first_round.truncate(quota);
        }
    }
    first_round.shuffle(rng);

    state.current_player_id = first_round.first().map(|p| p.id);
    state.participants = first_round;
    state.phase = start;
    state.viewed_phase = start;
    log::info!(
        "Tournament started at {} with {} of {} participants",
        start,
        state.participants.len(),
        state.original_participants.len()
    );
    Ok(())
}
