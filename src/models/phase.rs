//! Phase of the tournament bracket.

use serde::{Deserialize, Serialize};

/// Bracket phase. Declaration order is phase order.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Registering participants; not started.
    #[default]
    Setup,
    Qualification,
    Octavos,
    Cuartos,
    Semifinal,
    /// Last scored round; advancing out of it crowns the winner.
    Final,
    Finished,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Setup,
        Phase::Qualification,
        Phase::Octavos,
        Phase::Cuartos,
        Phase::Semifinal,
        Phase::Final,
        Phase::Finished,
    ];

    /// Phases in which scores are recorded.
    pub const SCORED: [Phase; 5] = [
        Phase::Qualification,
        Phase::Octavos,
        Phase::Cuartos,
        Phase::Semifinal,
        Phase::Final,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// The phase after this one, or `None` after `Finished`.
    pub fn next(self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The phase before this one, or `None` before `Setup`.
    pub fn previous(self) -> Option<Phase> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn is_scored(self) -> bool {
        Self::SCORED.contains(&self)
    }

    /// Whether a tournament whose first scored round is `start` records plain
    /// (non-accumulating) scores in this phase. Only qualification and octavos can
    /// open a bracket that way; a tournament resumed later starts in knockout.
    pub fn opens_bracket(self, start: Phase) -> bool {
        self == start && matches!(self, Phase::Qualification | Phase::Octavos)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Qualification => "qualification",
            Phase::Octavos => "octavos",
            Phase::Cuartos => "cuartos",
            Phase::Semifinal => "semifinal",
            Phase::Final => "final",
            Phase::Finished => "finished",
        };
        f.write_str(name)
    }
}
