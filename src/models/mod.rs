//! Data structures for the tournament: participants, phases, scores, tournament state.

mod participant;
mod phase;
mod score;
mod tournament;

pub use participant::{Participant, ParticipantId};
pub use phase::Phase;
pub use score::{
    KnockoutScoreRecord, RoundLedger, ScoreCard, ScoreEntry, ScoreRecord, BALLS_PER_ROUND,
    MAX_ACCUMULATED_TOTAL, MAX_BALL_SCORE, MAX_ROUND_TOTAL,
};
pub use tournament::{
    HistoryItem, TournamentConfig, TournamentError, TournamentState, HISTORY_LIMIT,
    MIN_PARTICIPANTS,
};
