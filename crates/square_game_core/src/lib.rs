//! Square Game core - session engine for a memory matching card game
//!
//! A grid of hidden colored cards must be cleared in pairs under a turn
//! limit (Score mode) or a countdown (Time and Difficult modes).
//!
//! # Architecture
//!
//! - **Level resolver**: level number and mode to grid size and limits
//! - **Grid generator**: shuffled pairs with a pre-solved center on odd grids
//! - **Match engine**: card selection and pair resolution
//! - **Scheduler**: virtual-time timers tagged with a round generation
//! - **Scoring**: round score and achievement qualification
//! - **Session**: orchestration and the public API
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use square_game_core::{Collaborators, GameMode, GameState, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default(), Collaborators::default());
//! session.start_new_game(1, Some(GameMode::Score))?;
//! assert_eq!(session.state(), GameState::Peeking);
//!
//! session.advance_time(Duration::from_secs(3));
//! assert_eq!(session.state(), GameState::Playing);
//! # Ok::<(), square_game_core::GridError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod achievements;
mod collaborators;
mod config;
mod engine;
mod error;
mod grid;
mod level;
mod palette;
mod rules;
mod scoring;
mod session;
mod snapshot;
mod timing;
mod types;

// Crate-level exports - Domain types
pub use types::{BONUS_COLOR_INDEX, Card, CardId, GameMode, GameState, GameStats};

// Crate-level exports - Palette and grid
pub use grid::{CardShuffler, RandomShuffler, generate_cards};
pub use palette::{Color, ColorPalette};

// Crate-level exports - Level rules
pub use level::{
    DIFFICULT_TIME_LIMIT_SECS, LAST_DEFAULT_SCORE_LEVEL, LevelConfig, SCORE_TURN_BASE,
    TIME_LIMIT_SECS, difficult_grid_size,
};
pub use rules::{earns_perfect_bonus_life, effective_turn_cap, is_perfect, is_won, turns_exhausted};

// Crate-level exports - Match engine
pub use engine::{IgnoreReason, MatchEngine, Selection, TapOutcome};

// Crate-level exports - Timing
pub use timing::{Fired, Scheduler, Task, TaskId, TimerKind};

// Crate-level exports - Scoring and achievements
pub use achievements::{
    Achievement, AchievementKind, AchievementStatus, CATALOG, TIME_WIZARD_MIN_SECS, achievement,
    achievement_statuses, round_achievements,
};
pub use scoring::{
    LEVEL_POINTS, MATCH_POINTS, PERFECT_BONUS, RoundOutcome, SECOND_POINTS, SPARE_TURN_POINTS,
    ScoreBreakdown, score_round,
};

// Crate-level exports - Session
pub use collaborators::{
    Collaborators, Feedback, FeedbackSink, HighScoreStore, NoopFeedback, NoopHighScoreStore,
    NoopProfileReporter, ProfileReporter, StateObserver,
};
pub use config::SessionConfig;
pub use error::{CollaboratorError, GridError, PaletteError};
pub use session::{DEFAULT_PLAYER_NAME, Session};
pub use snapshot::Snapshot;
