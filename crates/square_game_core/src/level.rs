//! Level configuration resolver.
//!
//! Maps a level number and an optional explicit mode to the grid size and the
//! turn or time limit of that level.

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::types::GameMode;

/// `maxTurns = SCORE_TURN_BASE - level` in Score mode.
pub const SCORE_TURN_BASE: u32 = 11;

/// Countdown length in Time mode.
pub const TIME_LIMIT_SECS: u32 = 30;

/// Countdown length in Difficult mode.
pub const DIFFICULT_TIME_LIMIT_SECS: u32 = 45;

/// Last level that defaults to Score mode when no mode is requested.
pub const LAST_DEFAULT_SCORE_LEVEL: u32 = 7;

const BASE_GRID_SIZE: usize = 3;

/// Resolved rules for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    level: u32,
    mode: GameMode,
    max_turns: Option<u32>,
    max_time: Option<u32>,
    grid_size: usize,
}

impl LevelConfig {
    /// Resolves the configuration for `level`.
    ///
    /// With no explicit mode, levels 1-7 play as Score and 8+ as Time.
    /// Level 0 is treated as level 1.
    #[instrument]
    pub fn resolve(level: u32, mode: Option<GameMode>) -> Self {
        let level = if level == 0 {
            warn!("Level 0 requested, using level 1");
            1
        } else {
            level
        };

        let mode = mode.unwrap_or(if level <= LAST_DEFAULT_SCORE_LEVEL {
            GameMode::Score
        } else {
            GameMode::Time
        });

        match mode {
            GameMode::Score => Self {
                level,
                mode,
                max_turns: Some(SCORE_TURN_BASE.saturating_sub(level).max(1)),
                max_time: None,
                grid_size: BASE_GRID_SIZE,
            },
            GameMode::Time => Self {
                level,
                mode,
                max_turns: None,
                max_time: Some(TIME_LIMIT_SECS),
                grid_size: BASE_GRID_SIZE,
            },
            GameMode::Difficult => Self {
                level,
                mode,
                max_turns: None,
                max_time: Some(DIFFICULT_TIME_LIMIT_SECS),
                grid_size: difficult_grid_size(level),
            },
        }
    }

    /// Level number (at least 1).
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Rule set.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Turn cap; Score mode only.
    pub fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }

    /// Countdown length in seconds; Time and Difficult modes only.
    pub fn max_time(&self) -> Option<u32> {
        self.max_time
    }

    /// Side length of the square grid.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Number of cells on the grid.
    pub fn total_cells(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Number of pairs to find.
    pub fn pair_count(&self) -> u32 {
        (self.total_cells() / 2) as u32
    }

    /// Turn count of a flawless round: one turn per pair.
    pub fn perfect_turns(&self) -> u32 {
        self.pair_count()
    }

    /// Whether the grid carries a bonus center cell.
    pub fn has_bonus_cell(&self) -> bool {
        self.total_cells() % 2 == 1
    }
}

/// Grid side for Difficult mode: grows one step every three levels, capped at 6.
pub fn difficult_grid_size(level: u32) -> usize {
    match level {
        0..=3 => 3,
        4..=6 => 4,
        7..=9 => 5,
        _ => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_mode_turn_cap_shrinks_with_level() {
        let config = LevelConfig::resolve(1, Some(GameMode::Score));
        assert_eq!(config.max_turns(), Some(10));
        assert_eq!(config.max_time(), None);
        assert_eq!(config.grid_size(), 3);

        assert_eq!(LevelConfig::resolve(7, Some(GameMode::Score)).max_turns(), Some(4));
        assert_eq!(LevelConfig::resolve(10, Some(GameMode::Score)).max_turns(), Some(1));
        assert_eq!(LevelConfig::resolve(40, Some(GameMode::Score)).max_turns(), Some(1));
    }

    #[test]
    fn time_mode_has_clock_and_no_turn_cap() {
        let config = LevelConfig::resolve(2, Some(GameMode::Time));
        assert_eq!(config.max_time(), Some(30));
        assert_eq!(config.max_turns(), None);
        assert_eq!(config.grid_size(), 3);
    }

    #[test]
    fn difficult_grid_grows_by_tier() {
        let sizes: Vec<usize> = (1..=12)
            .map(|level| LevelConfig::resolve(level, Some(GameMode::Difficult)).grid_size())
            .collect();
        assert_eq!(sizes, [3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6]);
        assert_eq!(difficult_grid_size(250), 6);

        let config = LevelConfig::resolve(5, Some(GameMode::Difficult));
        assert_eq!(config.max_time(), Some(45));
        assert_eq!(config.max_turns(), None);
    }

    #[test]
    fn default_progression_switches_to_time_after_level_seven() {
        assert_eq!(LevelConfig::resolve(7, None).mode(), GameMode::Score);
        assert_eq!(LevelConfig::resolve(7, None).max_turns(), Some(4));
        let eighth = LevelConfig::resolve(8, None);
        assert_eq!(eighth.mode(), GameMode::Time);
        assert_eq!(eighth.max_time(), Some(30));
        assert_eq!(eighth.grid_size(), 3);
    }

    #[test]
    fn level_zero_is_clamped() {
        assert_eq!(LevelConfig::resolve(0, None).level(), 1);
    }

    #[test]
    fn pair_count_and_bonus_cell() {
        let odd = LevelConfig::resolve(1, Some(GameMode::Difficult));
        assert_eq!(odd.pair_count(), 4);
        assert_eq!(odd.perfect_turns(), 4);
        assert!(odd.has_bonus_cell());

        let even = LevelConfig::resolve(4, Some(GameMode::Difficult));
        assert_eq!(even.pair_count(), 8);
        assert!(!even.has_bonus_cell());

        let six = LevelConfig::resolve(10, Some(GameMode::Difficult));
        assert_eq!(six.total_cells(), 36);
        assert_eq!(six.pair_count(), 18);
    }
}
