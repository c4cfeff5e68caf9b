//! Persistence collaborator: an opaque key-value store and the two keys the caller keeps there.
//!
//! The engine never touches storage. The caller restores once at startup and
//! persists after every transition.

use crate::logic::{dedup_history, load_state};
use crate::models::{HistoryItem, Phase, TournamentState};
use std::collections::HashMap;
use std::path::PathBuf;

/// Key of the live tournament (present only while a tournament is running).
pub const STATE_KEY: &str = "tournament_state";

/// Key of the finished-tournament history list.
pub const HISTORY_KEY: &str = "tournament_history";

/// Errors from the backing store.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Storage I/O error: {}", e),
            StoreError::Json(e) => write!(f, "Storage encoding error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

/// String key-value storage.
pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-process store (lost on exit).
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        // Readers never see a half-written value.
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, value)?;
        std::fs::rename(tmp, self.path(key))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// A live tournament worth keeping: started, not finished, not opened from history.
fn is_active(state: &TournamentState) -> bool {
    !matches!(state.phase, Phase::Setup | Phase::Finished) && !state.is_archived()
}

/// Read the stored state back. A live tournament that is corrupt, finished or
/// fails `load_state` is discarded in favour of an empty one; the history is
/// de-duplicated by id.
pub fn restore<S: StateStore + ?Sized>(store: &S) -> Result<TournamentState, StoreError> {
    let mut state = match store.get(STATE_KEY)? {
        Some(raw) => match serde_json::from_str::<TournamentState>(&raw) {
            Ok(stored) if is_active(&stored) => {
                let mut state = TournamentState::new();
                match load_state(&mut state, stored) {
                    Ok(()) => state,
                    Err(e) => {
                        log::warn!("Discarding stored tournament: {}", e);
                        TournamentState::new()
                    }
                }
            }
            Ok(_) => TournamentState::new(),
            Err(e) => {
                log::warn!("Discarding unreadable stored tournament: {}", e);
                TournamentState::new()
            }
        },
        None => TournamentState::new(),
    };

    if let Some(raw) = store.get(HISTORY_KEY)? {
        match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
            Ok(items) => state.history = dedup_history(items),
            Err(e) => log::warn!("Discarding unreadable stored history: {}", e),
        }
    }
    Ok(state)
}

/// Write what changed between `previous` and `next`: the live tournament while one
/// is running (removed otherwise), and the history list when it differs.
pub fn persist<S: StateStore + ?Sized>(
    store: &mut S,
    previous: &TournamentState,
    next: &TournamentState,
) -> Result<(), StoreError> {
    if is_active(next) {
        store.set(STATE_KEY, serde_json::to_string(&next.without_history())?)?;
    } else {
        store.remove(STATE_KEY)?;
    }
    if previous.history != next.history {
        if next.history.is_empty() {
            store.remove(HISTORY_KEY)?;
        } else {
            store.set(HISTORY_KEY, serde_json::to_string(&next.history)?)?;
        }
    }
    Ok(())
}
