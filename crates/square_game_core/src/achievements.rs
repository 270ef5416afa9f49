//! Achievement catalog and per-round qualification.
//!
//! The catalog is static. Which achievements a player has unlocked is owned
//! by the profile collaborator; this module only merges that set with the
//! catalog at read time and decides which round-level achievements a
//! finished round qualifies for.

use std::collections::HashSet;

use derive_new::new;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, instrument};

use crate::scoring::RoundOutcome;
use crate::types::GameMode;

/// Seconds that must remain on the clock for Time Wizard.
pub const TIME_WIZARD_MIN_SECS: u32 = 20;

/// Kind of achievement; its snake_case name is the persisted id.
///
/// Declaration order is catalog order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AchievementKind {
    /// Win any level.
    FirstWin,
    /// Win a Score level with one turn per pair.
    PerfectGame,
    /// Win several Time levels.
    Speedster,
    /// Play many games.
    MarathonRunner,
    /// Reach a high level.
    LevelMaster,
    /// Accumulate a large total score.
    ScoreHunter,
    /// Find many pairs overall.
    MatchMaker,
    /// Win after spending a bonus life.
    Survivor,
    /// Win several Difficult levels.
    DifficultChampion,
    /// Win a clocked level with time to spare.
    TimeWizard,
}

impl AchievementKind {
    /// Persisted identifier, e.g. `"perfect_game"`.
    pub fn id(self) -> &'static str {
        self.into()
    }

    /// Parses a persisted identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        id.parse().ok()
    }
}

/// Static catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    /// What the achievement is for.
    pub kind: AchievementKind,
    /// Display title.
    pub title: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Icon name for the UI.
    pub icon: &'static str,
    /// Threshold for cumulative achievements; 1 for one-off ones.
    pub requirement: u32,
}

impl Achievement {
    /// Persisted identifier.
    pub fn id(&self) -> &'static str {
        self.kind.id()
    }
}

/// All achievements, in display order; entry `i` is kind `i`.
pub static CATALOG: [Achievement; AchievementKind::COUNT] = [
    Achievement {
        kind: AchievementKind::FirstWin,
        title: "First Victory",
        description: "Complete your first level",
        icon: "star.fill",
        requirement: 1,
    },
    Achievement {
        kind: AchievementKind::PerfectGame,
        title: "Perfect Memory",
        description: "Complete a Score level using one turn per pair",
        icon: "crown.fill",
        requirement: 1,
    },
    Achievement {
        kind: AchievementKind::Speedster,
        title: "Speedster",
        description: "Complete 5 time mode levels",
        icon: "bolt.fill",
        requirement: 5,
    },
    Achievement {
        kind: AchievementKind::MarathonRunner,
        title: "Marathon Runner",
        description: "Play 50 games",
        icon: "figure.run",
        requirement: 50,
    },
    Achievement {
        kind: AchievementKind::LevelMaster,
        title: "Level Master",
        description: "Reach level 10",
        icon: "flag.checkered",
        requirement: 10,
    },
    Achievement {
        kind: AchievementKind::ScoreHunter,
        title: "Score Hunter",
        description: "Accumulate 10,000 total points",
        icon: "target",
        requirement: 10_000,
    },
    Achievement {
        kind: AchievementKind::MatchMaker,
        title: "Match Maker",
        description: "Find 500 matches",
        icon: "heart.fill",
        requirement: 500,
    },
    Achievement {
        kind: AchievementKind::Survivor,
        title: "Survivor",
        description: "Win a level after using a bonus life",
        icon: "shield.fill",
        requirement: 1,
    },
    Achievement {
        kind: AchievementKind::DifficultChampion,
        title: "Difficult Champion",
        description: "Complete 10 difficult mode levels",
        icon: "flame.fill",
        requirement: 10,
    },
    Achievement {
        kind: AchievementKind::TimeWizard,
        title: "Time Wizard",
        description: "Finish with 20+ seconds remaining",
        icon: "clock.fill",
        requirement: TIME_WIZARD_MIN_SECS,
    },
];

/// Catalog entry for `kind`.
pub fn achievement(kind: AchievementKind) -> &'static Achievement {
    &CATALOG[kind as usize]
}

/// A catalog entry combined with the player's unlock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, new)]
pub struct AchievementStatus {
    /// The catalog entry.
    pub achievement: Achievement,
    /// Whether the player has it.
    pub unlocked: bool,
}

/// Merges the catalog with the set of unlocked ids held by the profile.
///
/// Unknown ids in `unlocked` are ignored.
#[instrument(skip(unlocked), fields(unlocked = unlocked.len()))]
pub fn achievement_statuses(unlocked: &HashSet<String>) -> Vec<AchievementStatus> {
    CATALOG
        .iter()
        .map(|a| AchievementStatus::new(*a, unlocked.contains(a.id())))
        .collect()
}

/// Round-level achievements a finished round qualifies for.
///
/// Only wins qualify. Cumulative achievements (streaks, totals) are decided
/// by the profile collaborator.
#[instrument(skip(outcome), fields(level = outcome.level, mode = %outcome.mode, win = outcome.is_win))]
pub fn round_achievements(outcome: &RoundOutcome) -> Vec<AchievementKind> {
    let mut earned = Vec::new();
    if !outcome.is_win {
        return earned;
    }
    if outcome.mode == GameMode::Score && outcome.is_perfect {
        earned.push(AchievementKind::PerfectGame);
    }
    if outcome.mode.has_countdown() && outcome.time_remaining >= TIME_WIZARD_MIN_SECS {
        earned.push(AchievementKind::TimeWizard);
    }
    if outcome.used_bonus_life {
        earned.push(AchievementKind::Survivor);
    }
    debug!(?earned, "Round achievements evaluated");
    earned
}
