//! Local high-score table persisted as JSON.
//!
//! Inside a running session the table is reached through
//! [`ChannelHighScoreStore`]: it answers from an in-memory copy and queues
//! each new entry to a background writer, so the session never waits on
//! the disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use square_game_core::{CollaboratorError, HighScoreStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player name.
    name: String,
    /// Round score.
    score: u32,
    /// Level the score was made on.
    level: u32,
    /// When it was recorded.
    date: DateTime<Utc>,
}

impl HighScoreEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(name: impl Into<String>, score: u32, level: u32) -> Self {
        Self {
            name: name.into(),
            score,
            level,
            date: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTable {
    #[serde(default)]
    entries: Vec<HighScoreEntry>,
    #[serde(default)]
    last_player_name: Option<String>,
}

/// Top-N scores, best first.
///
/// Equal scores keep the order they were recorded in. A table opened from a
/// path writes itself back after every change.
#[derive(Debug, Clone)]
pub struct HighScoreTable {
    path: Option<PathBuf>,
    capacity: usize,
    entries: Vec<HighScoreEntry>,
    last_player_name: Option<String>,
}

impl HighScoreTable {
    /// A table that is never written to disk.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            path: None,
            capacity,
            entries: Vec::new(),
            last_player_name: None,
        }
    }

    /// Opens the table stored at `path`; a missing file is an empty table.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self, HighScoreError> {
        let path = path.as_ref().to_path_buf();
        let stored = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| HighScoreError::new(format!("Failed to read high scores: {}", e)))?;
            serde_json::from_str::<StoredTable>(&content)
                .map_err(|e| HighScoreError::new(format!("Failed to parse high scores: {}", e)))?
        } else {
            debug!("No high score file yet");
            StoredTable::default()
        };

        let mut table = Self {
            path: Some(path),
            capacity,
            entries: stored.entries,
            last_player_name: stored.last_player_name,
        };
        table.normalize();
        info!(entries = table.entries.len(), "High scores loaded");
        Ok(table)
    }

    /// Entries, best first.
    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Name used for the most recent entry.
    pub fn last_player_name(&self) -> Option<&str> {
        self.last_player_name.as_deref()
    }

    /// Whether `score` would enter the table.
    pub fn qualifies(&self, score: u32) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.entries.len() < self.capacity {
            return true;
        }
        self.entries.last().is_some_and(|lowest| score > lowest.score)
    }

    /// Inserts an entry and returns its zero-based rank, or `None` if it did
    /// not make the table.
    #[instrument(skip(self), fields(entries = self.entries.len()))]
    pub fn record(&mut self, name: &str, score: u32, level: u32) -> Result<Option<usize>, HighScoreError> {
        let rank = self.insert(HighScoreEntry::new(name, score, level));
        self.save()?;
        debug!(?rank, "High score recorded");
        Ok(rank)
    }

    /// Removes every entry.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<(), HighScoreError> {
        self.entries.clear();
        info!("High scores cleared");
        self.save()
    }

    /// Writes the table to its path, if it has one.
    #[instrument(skip(self))]
    pub fn save(&self) -> Result<(), HighScoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| HighScoreError::new(format!("Failed to create directory: {}", e)))?;
        }
        std::fs::write(path, self.encode()?)
            .map_err(|e| HighScoreError::new(format!("Failed to write high scores: {}", e)))
    }

    /// Writes the table to its path without blocking the runtime.
    #[instrument(skip(self))]
    pub async fn save_async(&self) -> Result<(), HighScoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HighScoreError::new(format!("Failed to create directory: {}", e)))?;
        }
        tokio::fs::write(path, self.encode()?)
            .await
            .map_err(|e| HighScoreError::new(format!("Failed to write high scores: {}", e)))
    }

    /// In-memory copy that is never written to disk.
    fn detached(&self) -> Self {
        Self {
            path: None,
            ..self.clone()
        }
    }

    fn insert(&mut self, entry: HighScoreEntry) -> Option<usize> {
        self.last_player_name = Some(entry.name.clone());
        if !self.qualifies(entry.score) {
            return None;
        }
        let rank = self.entries.partition_point(|e| e.score >= entry.score);
        self.entries.insert(rank, entry);
        self.entries.truncate(self.capacity);
        Some(rank)
    }

    fn encode(&self) -> Result<String, HighScoreError> {
        let stored = StoredTable {
            entries: self.entries.clone(),
            last_player_name: self.last_player_name.clone(),
        };
        serde_json::to_string_pretty(&stored)
            .map_err(|e| HighScoreError::new(format!("Failed to encode high scores: {}", e)))
    }

    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(self.capacity);
    }
}

/// Writes synchronously; suited to in-memory tables and tools. Sessions
/// that persist to disk use [`spawn_high_score_writer`].
impl HighScoreStore for HighScoreTable {
    fn is_high_score(&self, score: u32) -> bool {
        self.qualifies(score)
    }

    fn record_high_score(&mut self, name: &str, score: u32, level: u32) -> Result<(), CollaboratorError> {
        self.record(name, score, level)
            .map(|_| ())
            .map_err(|e| CollaboratorError::new(e.to_string()))
    }
}

/// Session-side high-score store that never touches the disk.
///
/// Answers qualification from an in-memory copy of the table and queues
/// every recorded entry to the writer task.
#[derive(Debug, Clone)]
pub struct ChannelHighScoreStore {
    table: HighScoreTable,
    writes: mpsc::Sender<HighScoreEntry>,
}

impl ChannelHighScoreStore {
    /// Entries as the session sees them, best first.
    pub fn entries(&self) -> &[HighScoreEntry] {
        self.table.entries()
    }
}

impl HighScoreStore for ChannelHighScoreStore {
    fn is_high_score(&self, score: u32) -> bool {
        self.table.qualifies(score)
    }

    fn record_high_score(&mut self, name: &str, score: u32, level: u32) -> Result<(), CollaboratorError> {
        let entry = HighScoreEntry::new(name, score, level);
        self.writes.try_send(entry.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CollaboratorError::new("High score queue is full"),
            mpsc::error::TrySendError::Closed(_) => {
                CollaboratorError::new("High score writer has stopped")
            }
        })?;
        self.table.insert(entry);
        Ok(())
    }
}

/// Moves `table` onto a task that applies and saves every queued entry.
///
/// The task ends once every store clone is dropped and the queue drains.
#[instrument(skip(table), fields(entries = table.entries.len()))]
pub fn spawn_high_score_writer(
    table: HighScoreTable,
    capacity: usize,
) -> (ChannelHighScoreStore, JoinHandle<()>) {
    let (writes, mut rx) = mpsc::channel::<HighScoreEntry>(capacity.max(1));
    let store = ChannelHighScoreStore {
        table: table.detached(),
        writes,
    };
    let mut table = table;
    let handle = tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            let rank = table.insert(entry);
            match table.save_async().await {
                Ok(()) => debug!(?rank, "High score saved"),
                Err(error) => warn!(%error, "Failed to save high scores"),
            }
        }
        debug!("High score writer stopped");
    });
    (store, handle)
}

/// High-score persistence error.
#[derive(Debug, Clone, Display, Error)]
#[display("High score error: {} at {}:{}", message, file, line)]
pub struct HighScoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl HighScoreError {
    /// Creates a new high-score error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
