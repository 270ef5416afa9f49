//! Win detection and the perfect-game reward.

use tracing::instrument;

use crate::level::LevelConfig;
use crate::types::{GameMode, GameStats};

/// True once every pair has been found.
#[instrument(skip(config, stats), fields(matches = stats.matches_found, pairs = config.pair_count()))]
pub fn is_won(config: &LevelConfig, stats: &GameStats) -> bool {
    stats.matches_found >= config.pair_count()
}

/// A completed grid that took exactly one turn per pair.
pub fn is_perfect(config: &LevelConfig, stats: &GameStats) -> bool {
    is_won(config, stats) && stats.turns == config.perfect_turns()
}

/// Score-mode perfect games earn one extra bonus life.
pub fn earns_perfect_bonus_life(config: &LevelConfig, stats: &GameStats) -> bool {
    config.mode() == GameMode::Score && is_perfect(config, stats)
}
