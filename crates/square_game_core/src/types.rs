//! Core domain types for the memory matching game.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Color index reserved for the pre-solved center card of odd grids.
pub const BONUS_COLOR_INDEX: i32 = -1;

/// Stable identity of a card within one generated grid.
///
/// Positions can be re-colored by the difficult-mode reshuffle, so deferred
/// actions refer to cards by identity rather than by index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[display("card#{}", _0)]
pub struct CardId(pub u32);

/// A single card on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Identity, unique within the grid.
    pub id: CardId,
    /// Pair identity; [`BONUS_COLOR_INDEX`] for the bonus cell.
    pub color_index: i32,
    /// Face up.
    pub is_flipped: bool,
    /// Already paired.
    pub is_matched: bool,
    /// The pre-solved center cell.
    pub is_bonus: bool,
}

impl Card {
    /// Creates a face-down, unmatched card.
    pub fn new(id: CardId, color_index: i32) -> Self {
        Self {
            id,
            color_index,
            is_flipped: false,
            is_matched: false,
            is_bonus: false,
        }
    }

    /// Creates the bonus card: always face up and already matched.
    pub fn bonus(id: CardId) -> Self {
        Self {
            id,
            color_index: BONUS_COLOR_INDEX,
            is_flipped: true,
            is_matched: true,
            is_bonus: true,
        }
    }

    /// True when the card can still be picked by the player.
    pub fn is_selectable(&self) -> bool {
        !self.is_bonus && !self.is_matched && !self.is_flipped
    }
}

/// Rule set for a level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GameMode {
    /// Limited number of turns, no clock.
    Score,
    /// Fixed grid against a countdown.
    Time,
    /// Countdown, growing grid, and colors reshuffled after every match.
    Difficult,
}

impl GameMode {
    /// Returns whether rounds in this mode run against a countdown.
    pub fn has_countdown(self) -> bool {
        matches!(self, Self::Time | Self::Difficult)
    }

    /// Human-readable mode name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Score => "Score Mode",
            Self::Time => "Time Mode",
            Self::Difficult => "Difficult Mode",
        }
    }
}

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameState {
    /// No round in progress.
    #[default]
    Menu,
    /// All cards revealed briefly before play.
    Peeking,
    /// Accepting taps.
    Playing,
    /// Round frozen; countdown stopped.
    Paused,
    /// All pairs found.
    Won,
    /// Out of turns or time with no bonus life left.
    Lost,
}

impl GameState {
    /// Returns true for the two round-end phases.
    pub fn is_round_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Returns true while a round is on the board (peeking, playing or paused).
    pub fn is_in_round(self) -> bool {
        matches!(self, Self::Peeking | Self::Playing | Self::Paused)
    }
}

/// Per-attempt counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    /// Completed pair attempts.
    pub turns: u32,
    /// Pairs found so far.
    pub matches_found: u32,
    /// Seconds left on the countdown (Time and Difficult modes).
    pub time_remaining: u32,
    /// Recovery credits available.
    pub bonus_lives: u32,
    /// Level being played.
    pub current_level: u32,
    /// Score of the finished round; zero while the round is running.
    pub total_score: u32,
    /// Difficult-mode reshuffles performed this round.
    pub color_shuffles: u32,
    /// Whether a bonus life was consumed during this round.
    pub bonus_life_used: bool,
}

impl GameStats {
    /// Fresh counters for an attempt at `level`.
    pub fn for_level(level: u32, bonus_lives: u32) -> Self {
        Self {
            turns: 0,
            matches_found: 0,
            time_remaining: 0,
            bonus_lives,
            current_level: level,
            total_score: 0,
            color_shuffles: 0,
            bonus_life_used: false,
        }
    }
}

impl Default for GameStats {
    fn default() -> Self {
        Self::for_level(1, 1)
    }
}
