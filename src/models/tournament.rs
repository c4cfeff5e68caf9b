//! TournamentState (the aggregate root), its configuration and history items.

use crate::models::participant::{Participant, ParticipantId};
use crate::models::phase::Phase;
use crate::models::score::{RoundLedger, ScoreEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Most recent finished tournaments kept in history.
pub const HISTORY_LIMIT: usize = 20;

/// Participants needed to start a tournament.
pub const MIN_PARTICIPANTS: usize = 2;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Tournament is not in a phase that allows this action.
    InvalidState,
    /// Not enough participants to start.
    NotEnoughPlayersToStart { required: usize },
    /// Participant not found in the roster this action looks at.
    ParticipantNotFound(ParticipantId),
    /// Participant names cannot be blank.
    EmptyName,
    /// The participant already has a score in the active phase.
    AlreadyScored { phase: Phase, participant_id: ParticipantId },
    /// Not every participant of the active phase has a score.
    IncompleteResults,
    /// The final has no scores to pick a winner from.
    NoFinalScores,
    /// Only scored phases can be chosen as start phase or given a quota.
    NotAScoredPhase(Phase),
    /// Nobody would advance into this phase.
    EmptyQuota(Phase),
    /// A score card is malformed (wrong length or out-of-range ball).
    InvalidScores { reason: String },
    /// Round navigation went past the first recorded or the active phase.
    NavigationOutOfRange,
    /// No history item with this id.
    HistoryItemNotFound(String),
    /// A loaded snapshot violates the state invariants.
    InvalidSnapshot(String),
    /// Pasted roster text could not be read.
    RosterImport(String),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::NotEnoughPlayersToStart { required } => {
                write!(f, "Need at least {} participants to start", required)
            }
            TournamentError::ParticipantNotFound(_) => write!(f, "Participant not found"),
            TournamentError::EmptyName => write!(f, "Participant name cannot be empty"),
            TournamentError::AlreadyScored { phase, .. } => {
                write!(f, "Participant already has a score in {}", phase)
            }
            TournamentError::IncompleteResults => write!(f, "Not every participant has a score"),
            TournamentError::NoFinalScores => write!(f, "The final has no scores"),
            TournamentError::NotAScoredPhase(phase) => write!(f, "{} is not a scored phase", phase),
            TournamentError::EmptyQuota(phase) => write!(f, "At least one participant must advance into {}", phase),
            TournamentError::InvalidScores { reason } => write!(f, "Invalid scores: {}", reason),
            TournamentError::NavigationOutOfRange => write!(f, "No round to view in that direction"),
            TournamentError::HistoryItemNotFound(id) => write!(f, "No history item with id {}", id),
            TournamentError::InvalidSnapshot(reason) => write!(f, "Invalid tournament snapshot: {}", reason),
            TournamentError::RosterImport(reason) => write!(f, "Could not read participant list: {}", reason),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Fixed at setup: where the bracket starts and how many advance into each phase.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub start_phase: Phase,
    /// Participants advancing *into* each phase (the quota of the phase itself
    /// caps the roster when the tournament starts there).
    pub players_per_round: BTreeMap<Phase, usize>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            start_phase: Phase::Qualification,
            players_per_round: BTreeMap::from([
                (Phase::Qualification, 0),
                (Phase::Octavos, 16),
                (Phase::Cuartos, 8),
                (Phase::Semifinal, 4),
                (Phase::Final, 2),
                (Phase::Finished, 0),
            ]),
        }
    }
}

impl TournamentConfig {
    /// Quota for `phase` (0 when unset).
    pub fn quota(&self, phase: Phase) -> usize {
        self.players_per_round.get(&phase).copied().unwrap_or(0)
    }
}

/// A finished tournament kept for later inspection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub state: TournamentState,
}

/// Full tournament state: roster, phase, scores, and history of finished tournaments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentState {
    pub phase: Phase,
    /// Phase whose results are being inspected; never after `phase`.
    pub viewed_phase: Phase,
    /// Current round roster, in playing order.
    pub participants: Vec<Participant>,
    /// Everyone registered when the tournament started (for name lookups).
    pub original_participants: Vec<Participant>,
    pub config: TournamentConfig,
    pub rounds: RoundLedger,
    /// Whose turn it is to be scored in the active phase.
    pub current_player_id: Option<ParticipantId>,
    pub winner: Option<Participant>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Newest first, at most `HISTORY_LIMIT` items, unique ids.
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

impl TournamentState {
    /// Empty tournament in Setup with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tournament in Setup with the given roster (e.g. restored from a form).
    pub fn with_participants(participants: Vec<Participant>) -> Self {
        Self {
            participants,
            ..Self::new()
        }
    }

    /// Look up a participant by id among everyone registered (falls back to the
    /// current roster while still in Setup).
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.original_participants
            .iter()
            .chain(self.participants.iter())
            .find(|p| p.id == id)
    }

    /// Snapshot restored from history (carries a finish time): read-only.
    pub fn is_archived(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Same state with the history list dropped (what gets archived or persisted as live state).
    pub fn without_history(&self) -> Self {
        Self {
            history: Vec::new(),
            ..self.clone()
        }
    }

    fn ensure_setup(&self) -> Result<(), TournamentError> {
        if self.phase != Phase::Setup {
            return Err(TournamentError::InvalidState);
        }
        Ok(())
    }

    /// Add a participant (Setup only). The name is trimmed and must not be blank.
    pub fn add_participant(&mut self, name: &str) -> Result<ParticipantId, TournamentError> {
        self.ensure_setup()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::EmptyName);
        }
        let participant = Participant::new(name);
        let id = participant.id;
        self.participants.push(participant);
        Ok(id)
    }

    /// Add many participants at once (Setup only). Blank names are dropped, as is any
    /// name matching (case-sensitively) an existing participant or an earlier name in
    /// the batch. Returns how many were added.
    pub fn bulk_add_participants<S: AsRef<str>>(&mut self, names: &[S]) -> Result<usize, TournamentError> {
        self.ensure_setup()?;
        let mut taken: HashSet<String> = self.participants.iter().map(|p| p.name.clone()).collect();
        let before = self.participants.len();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || !taken.insert(name.to_string()) {
                continue;
            }
            self.participants.push(Participant::new(name));
        }
        Ok(self.participants.len() - before)
    }

    /// Remove a participant by id (Setup only).
    pub fn remove_participant(&mut self, participant_id: ParticipantId) -> Result<(), TournamentError> {
        self.ensure_setup()?;
        let idx = self
            .participants
            .iter()
            .position(|p| p.id == participant_id)
            .ok_or(TournamentError::ParticipantNotFound(participant_id))?;
        self.participants.remove(idx);
        Ok(())
    }

    /// Rename a participant (Setup only). The new name is trimmed and must not be blank.
    pub fn rename_participant(&mut self, participant_id: ParticipantId, name: &str) -> Result<(), TournamentError> {
        self.ensure_setup()?;
        if name.trim().is_empty() {
            return Err(TournamentError::EmptyName);
        }
        self.participants
            .iter_mut()
            .find(|p| p.id == participant_id)
            .ok_or(TournamentError::ParticipantNotFound(participant_id))?
            .rename(name);
        Ok(())
    }

    /// Choose the first scored phase (Setup only).
    pub fn set_start_phase(&mut self, phase: Phase) -> Result<(), TournamentError> {
        self.ensure_setup()?;
        if !phase.is_scored() {
            return Err(TournamentError::NotAScoredPhase(phase));
        }
        self.config.start_phase = phase;
        Ok(())
    }

    /// Set how many participants advance into `phase` (Setup only). Zero is only
    /// accepted where nobody advances in: qualification, or the start phase,
    /// where it lifts the roster cap.
    pub fn set_round_quota(&mut self, phase: Phase, quota: usize) -> Result<(), TournamentError> {
        self.ensure_setup()?;
        if !phase.is_scored() {
            return Err(TournamentError::NotAScoredPhase(phase));
        }
        if quota == 0 && phase != Phase::Qualification && phase != self.config.start_phase {
            return Err(TournamentError::EmptyQuota(phase));
        }
        self.config.players_per_round.insert(phase, quota);
        Ok(())
    }

    /// Check the invariants a loaded snapshot must satisfy: the viewed phase,
    /// roster membership, and a ledger whose records add up the way
    /// score submission builds them.
    pub fn validate(&self) -> Result<(), TournamentError> {
        let invalid = |reason: &str| Err(TournamentError::InvalidSnapshot(reason.to_string()));
        if self.viewed_phase > self.phase {
            return invalid("viewed phase is after the active phase");
        }
        let registered: HashSet<ParticipantId> = self.original_participants.iter().map(|p| p.id).collect();
        if self.phase != Phase::Setup && self.participants.iter().any(|p| !registered.contains(&p.id)) {
            return invalid("roster contains an unregistered participant");
        }
        for (phase, entries) in self.rounds.iter() {
            let bad = |what: &str| Err(TournamentError::InvalidSnapshot(format!("{} in {}", what, phase)));
            if !phase.is_scored() || phase > self.phase {
                return bad("scores recorded");
            }
            let mut seen = HashSet::new();
            let plain = phase.opens_bracket(self.config.start_phase);
            for entry in entries {
                if !seen.insert(entry.participant_id()) {
                    return bad("duplicate score");
                }
                if !registered.contains(&entry.participant_id()) {
                    return bad("score for an unregistered participant");
                }
                match entry {
                    ScoreEntry::Plain(r) if plain => {
                        if r.total != r.scores.total() {
                            return bad("round total does not match its balls");
                        }
                    }
                    ScoreEntry::Knockout(r) if !plain => {
                        if !r.is_consistent() {
                            return bad("accumulated total does not add up");
                        }
                        let carried = phase
                            .previous()
                            .and_then(|prev| self.rounds.find(prev, r.participant_id))
                            .map(ScoreEntry::effective_total)
                            .unwrap_or(0);
                        if r.previous_round_total != carried {
                            return bad("carried total does not match the previous round");
                        }
                    }
                    _ => return bad("wrong kind of score record"),
                }
            }
        }
        let mut ids = HashSet::new();
        if self.history.iter().any(|h| !ids.insert(h.id.as_str())) {
            return invalid("duplicate history id");
        }
        Ok(())
    }
}
