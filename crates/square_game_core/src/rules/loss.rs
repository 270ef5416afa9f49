//! Turn-budget exhaustion for Score mode.
//!
//! Timeouts in the clocked modes are driven by the countdown, not by these
//! rules.

use tracing::instrument;

use crate::level::LevelConfig;
use crate::types::GameStats;

/// Turn cap including turns granted by a consumed bonus life.
///
/// `None` for modes without a turn limit.
pub fn effective_turn_cap(config: &LevelConfig, extra_turns: u32) -> Option<u32> {
    config.max_turns().map(|max| max.saturating_add(extra_turns))
}

/// True when the player has used more turns than the (widened) cap allows.
#[instrument(skip(config, stats), fields(turns = stats.turns, max = ?config.max_turns()))]
pub fn turns_exhausted(config: &LevelConfig, stats: &GameStats, extra_turns: u32) -> bool {
    effective_turn_cap(config, extra_turns).is_some_and(|cap| stats.turns > cap)
}
