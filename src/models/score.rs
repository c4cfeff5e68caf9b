//! Score cards, per-round score records and the round ledger.

use crate::models::participant::ParticipantId;
use crate::models::phase::Phase;
use crate::models::tournament::TournamentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balls thrown per participant per round.
pub const BALLS_PER_ROUND: usize = 8;

/// Highest score a single ball can make.
pub const MAX_BALL_SCORE: u32 = 210;

/// Highest round total a card can add up to.
pub const MAX_ROUND_TOTAL: u32 = MAX_BALL_SCORE * BALLS_PER_ROUND as u32;

/// Highest accumulated total: a perfect card in every scored phase.
pub const MAX_ACCUMULATED_TOTAL: u32 = MAX_ROUND_TOTAL * Phase::SCORED.len() as u32;

/// The 8 ball scores of one participant in one round. Always valid once constructed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct ScoreCard([u32; BALLS_PER_ROUND]);

impl ScoreCard {
    /// Validate a list of ball scores: exactly 8 values, each in `0..=210`.
    pub fn new(scores: &[u32]) -> Result<Self, TournamentError> {
        let balls: [u32; BALLS_PER_ROUND] = scores.try_into().map_err(|_| TournamentError::InvalidScores {
            reason: format!("expected {} scores, got {}", BALLS_PER_ROUND, scores.len()),
        })?;
        if let Some(bad) = balls.iter().find(|&&s| s > MAX_BALL_SCORE) {
            return Err(TournamentError::InvalidScores {
                reason: format!("score {} is above the maximum of {}", bad, MAX_BALL_SCORE),
            });
        }
        Ok(Self(balls))
    }

    pub fn balls(&self) -> &[u32] {
        &self.0
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl TryFrom<Vec<u32>> for ScoreCard {
    type Error = TournamentError;

    fn try_from(scores: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(&scores)
    }
}

impl From<ScoreCard> for Vec<u32> {
    fn from(card: ScoreCard) -> Self {
        card.0.to_vec()
    }
}

/// Score of a participant in a bracket-opening round (no carried total).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub participant_id: ParticipantId,
    pub scores: ScoreCard,
    pub total: u32,
}

impl ScoreRecord {
    pub fn new(participant_id: ParticipantId, scores: ScoreCard) -> Self {
        Self {
            participant_id,
            total: scores.total(),
            scores,
        }
    }
}

/// Score of a participant in a knockout round, carrying the standing from the round before.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnockoutScoreRecord {
    pub participant_id: ParticipantId,
    pub scores: ScoreCard,
    pub total: u32,
    pub previous_round_total: u32,
    /// Always `previous_round_total + total`.
    pub accumulated_total: u32,
}

impl KnockoutScoreRecord {
    pub fn new(participant_id: ParticipantId, scores: ScoreCard, previous_round_total: u32) -> Self {
        let total = scores.total();
        Self {
            participant_id,
            scores,
            total,
            previous_round_total,
            accumulated_total: previous_round_total.saturating_add(total),
        }
    }

    /// Whether the carried and accumulated totals add up and stay in range.
    pub fn is_consistent(&self) -> bool {
        self.total == self.scores.total()
            && self.accumulated_total <= MAX_ACCUMULATED_TOTAL
            && self.previous_round_total.checked_add(self.total) == Some(self.accumulated_total)
    }
}

/// One ledger entry: plain in the bracket-opening round, knockout afterwards.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreEntry {
    Plain(ScoreRecord),
    Knockout(KnockoutScoreRecord),
}

impl ScoreEntry {
    pub fn participant_id(&self) -> ParticipantId {
        match self {
            ScoreEntry::Plain(r) => r.participant_id,
            ScoreEntry::Knockout(r) => r.participant_id,
        }
    }

    /// Round total (this round's balls only).
    pub fn total(&self) -> u32 {
        match self {
            ScoreEntry::Plain(r) => r.total,
            ScoreEntry::Knockout(r) => r.total,
        }
    }

    /// Total used for ranking: the accumulated total for knockout entries, else the round total.
    pub fn effective_total(&self) -> u32 {
        match self {
            ScoreEntry::Plain(r) => r.total,
            ScoreEntry::Knockout(r) => r.accumulated_total,
        }
    }

    pub fn scores(&self) -> &ScoreCard {
        match self {
            ScoreEntry::Plain(r) => &r.scores,
            ScoreEntry::Knockout(r) => &r.scores,
        }
    }
}

/// Score entries per phase, in submission order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundLedger(BTreeMap<Phase, Vec<ScoreEntry>>);

impl RoundLedger {
    /// Entries recorded in `phase` (empty if none).
    pub fn entries(&self, phase: Phase) -> &[ScoreEntry] {
        self.0.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, phase: Phase, participant_id: ParticipantId) -> Option<&ScoreEntry> {
        self.entries(phase)
            .iter()
            .find(|e| e.participant_id() == participant_id)
    }

    pub fn has_scores(&self, phase: Phase) -> bool {
        !self.entries(phase).is_empty()
    }

    /// Append an entry unless the participant already has one in `phase`.
    /// Returns whether the entry was recorded.
    pub fn record(&mut self, phase: Phase, entry: ScoreEntry) -> bool {
        if self.find(phase, entry.participant_id()).is_some() {
            return false;
        }
        self.0.entry(phase).or_default().push(entry);
        true
    }

    /// Phases with entries, with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &[ScoreEntry])> {
        self.0.iter().map(|(p, e)| (*p, e.as_slice()))
    }
}
