//! Local ranked-score store
//!
//! Fallback leaderboard used while the session service is unreachable.
//! Keeps the top 5 scores, persisted as JSON when a path is configured.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::LEADERBOARD_SIZE;

/// A leaderboard row as shown to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// 1-based position
    pub rank: u32,
    pub name: String,
    pub value: i64,
}

/// A stored entry (rank is derived from position)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScore {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("score file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-N local leaderboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalScoreStore {
    /// Sorted by value, highest first
    entries: Vec<StoredScore>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl LocalScoreStore {
    /// Create an empty, memory-only store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the store backed by `path`.
    ///
    /// A missing file starts an empty store; an unreadable one is logged and
    /// replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = match Self::load(&path) {
            Ok(store) => {
                log::info!("Loaded {} local scores from {}", store.entries.len(), path.display());
                store
            }
            Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No local scores at {}, starting fresh", path.display());
                Self::new()
            }
            Err(e) => {
                log::warn!("Ignoring local scores at {}: {}", path.display(), e);
                Self::new()
            }
        };
        store.path = Some(path);
        store
    }

    /// Read a store from a JSON file
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = fs::read_to_string(path)?;
        let mut store: LocalScoreStore = serde_json::from_str(&json)?;
        store.normalize();
        Ok(store)
    }

    /// Write the store to its backing file, if it has one
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Local scores saved ({} entries)", self.entries.len());
        Ok(())
    }

    /// Insert a score, then drop everything below the top 5.
    ///
    /// Returns the rank achieved (1-based), or `None` if the score fell off
    /// the end. Persistence failures are logged, never returned.
    pub fn insert(&mut self, name: &str, value: i64) -> Option<u32> {
        // Equal values keep their arrival order
        let pos = self
            .entries
            .iter()
            .position(|e| value > e.value)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            pos,
            StoredScore {
                name: name.to_string(),
                value,
            },
        );
        self.entries.truncate(LEADERBOARD_SIZE);

        if let Err(e) = self.save() {
            log::error!("Failed to persist local scores: {}", e);
        }

        (pos < LEADERBOARD_SIZE).then(|| pos as u32 + 1)
    }

    /// Ranked rows, highest value first
    pub fn top(&self) -> Vec<ScoreRecord> {
        self.entries
            .iter()
            .take(LEADERBOARD_SIZE)
            .enumerate()
            .map(|(i, e)| ScoreRecord {
                rank: i as u32 + 1,
                name: e.name.clone(),
                value: e.value,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore ordering and size after loading a hand-edited file
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.value.cmp(&a.value));
        self.entries.truncate(LEADERBOARD_SIZE);
    }
}
