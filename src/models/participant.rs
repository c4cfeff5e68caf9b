//! Participant data structure.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (used in score records and lookups).
pub type ParticipantId = Uuid;

/// A registered participant. Identity is stable once created; only the name can change.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    /// Create a new participant with a fresh id. The name is stored trimmed.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
        }
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }
}
