//! Read-only view of a session for rendering and observers.

use serde::Serialize;

use crate::engine::Selection;
use crate::level::LevelConfig;
use crate::scoring::RoundOutcome;
use crate::types::{Card, GameState, GameStats};

/// Everything a UI needs to draw the session, cloned at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Session phase.
    pub state: GameState,
    /// Cards in grid order; empty in the menu.
    pub cards: Vec<Card>,
    /// Round counters.
    pub stats: GameStats,
    /// Rules of the current level, if one has been started.
    pub level_config: Option<LevelConfig>,
    /// Match-engine selection state.
    pub selection: Selection,
    /// Seconds until auto-progress, while it is counting down.
    pub auto_progress_remaining: Option<u32>,
    /// Score waiting for a name before it enters the high-score table.
    pub pending_high_score: Option<u32>,
    /// Outcome of the most recently finished round.
    pub last_outcome: Option<RoundOutcome>,
    /// Round generation the snapshot belongs to.
    pub generation: u64,
}

impl Snapshot {
    /// Grid side length, or zero in the menu.
    pub fn grid_size(&self) -> usize {
        self.level_config.map(|c| c.grid_size()).unwrap_or(0)
    }

    /// Whether a mismatched pair is waiting to flip back.
    pub fn is_resolving(&self) -> bool {
        matches!(self.selection, Selection::Resolving { .. })
    }
}
