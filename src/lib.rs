//! Pasabolo tournament organizer: library with models, business logic and the intent reducer.

pub mod engine;
pub mod logic;
pub mod models;
pub mod persistence;

pub use engine::{apply, reduce, reduce_with, Intent};
pub use logic::{
    advance_phase, autocomplete_round, can_view_next, can_view_previous, next_unscored,
    parse_roster, round_complete, standings, start_tournament, submit_score, Standing,
};
pub use models::{
    HistoryItem, KnockoutScoreRecord, Participant, ParticipantId, Phase, RoundLedger, ScoreCard,
    ScoreEntry, ScoreRecord, TournamentConfig, TournamentError, TournamentState,
};
pub use persistence::{persist, restore, FileStore, MemoryStore, StateStore, StoreError};
