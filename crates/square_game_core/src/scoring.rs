//! Score formula and the per-round outcome reported to collaborators.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::achievements::{AchievementKind, round_achievements};
use crate::level::LevelConfig;
use crate::rules;
use crate::types::{GameMode, GameStats};

/// Points per pair found.
pub const MATCH_POINTS: u32 = 100;
/// Score-mode bonus for a perfect round.
pub const PERFECT_BONUS: u32 = 200;
/// Score-mode points per unused turn.
pub const SPARE_TURN_POINTS: u32 = 20;
/// Clocked-mode points per second left.
pub const SECOND_POINTS: u32 = 10;
/// Points per level number.
pub const LEVEL_POINTS: u32 = 50;

/// The three parts of a round score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Points for pairs found.
    pub base: u32,
    /// Turn or time efficiency bonus.
    pub bonus: u32,
    /// Points for the level number.
    pub level_bonus: u32,
}

impl ScoreBreakdown {
    /// Sum of all parts.
    pub fn total(&self) -> u32 {
        self.base
            .saturating_add(self.bonus)
            .saturating_add(self.level_bonus)
    }
}

/// Scores a finished round.
///
/// Score mode: +200 for a perfect round, otherwise 20 per turn left under
/// the cap. Time and Difficult: 10 per second left. Every mode adds 50 per
/// level.
#[instrument(skip(config, stats), fields(level = stats.current_level, mode = %config.mode()))]
pub fn score_round(config: &LevelConfig, stats: &GameStats) -> ScoreBreakdown {
    let base = stats.matches_found.saturating_mul(MATCH_POINTS);

    let bonus = match config.mode() {
        GameMode::Score => match config.max_turns() {
            _ if rules::is_perfect(config, stats) => PERFECT_BONUS,
            Some(max) if stats.turns < max => {
                (max - stats.turns).saturating_mul(SPARE_TURN_POINTS)
            }
            _ => 0,
        },
        GameMode::Time | GameMode::Difficult => {
            stats.time_remaining.saturating_mul(SECOND_POINTS)
        }
    };

    let breakdown = ScoreBreakdown {
        base,
        bonus,
        level_bonus: stats.current_level.saturating_mul(LEVEL_POINTS),
    };
    debug!(?breakdown, total = breakdown.total(), "Round scored");
    breakdown
}

/// Facts about a finished round, reported outward to the profile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Final round score.
    pub score: u32,
    /// Level played.
    pub level: u32,
    /// Rule set played.
    pub mode: GameMode,
    /// Whether all pairs were found.
    pub is_win: bool,
    /// Turns taken.
    pub turns_used: u32,
    /// Seconds left on the clock (zero in Score mode).
    pub time_remaining: u32,
    /// Pairs found.
    pub matches_found: u32,
    /// Whether a bonus life was consumed.
    pub used_bonus_life: bool,
    /// Won using exactly one turn per pair.
    pub is_perfect: bool,
    /// Round-level achievements this round qualifies for.
    pub achievements: Vec<AchievementKind>,
}

impl RoundOutcome {
    /// Builds the outcome from final counters; `stats.total_score` must
    /// already hold the round score.
    #[instrument(skip(config, stats))]
    pub fn from_round(config: &LevelConfig, stats: &GameStats, is_win: bool) -> Self {
        let mut outcome = Self {
            score: stats.total_score,
            level: config.level(),
            mode: config.mode(),
            is_win,
            turns_used: stats.turns,
            time_remaining: stats.time_remaining,
            matches_found: stats.matches_found,
            used_bonus_life: stats.bonus_life_used,
            is_perfect: is_win && rules::is_perfect(config, stats),
            achievements: Vec::new(),
        };
        outcome.achievements = round_achievements(&outcome);
        outcome
    }
}
