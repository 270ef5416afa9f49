//! Square Game - real-time driver, collaborators and headless players
//!
//! Wraps the [`square_game_core`] session engine with everything a running
//! program needs.
//!
//! # Architecture
//!
//! - **Driver**: runs a session on a tokio task and publishes snapshots
//! - **Profile**: cumulative stats, streaks and achievements behind an async store
//! - **High scores**: local top-N table persisted as JSON
//! - **Feedback**: notifications routed to the log
//! - **Bot**: a simulated player with bounded memory
//! - **Config**: TOML application settings
//!
//! # Example
//!
//! ```no_run
//! use square_game::{MemoryBot, SessionDriver, play_round};
//! use square_game_core::{Collaborators, GameMode, Session, SessionConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let session = Session::new(SessionConfig::default(), Collaborators::default());
//! let handle = SessionDriver::spawn(session, Duration::from_millis(50));
//!
//! handle.start_new_game(1, Some(GameMode::Score)).await?;
//! let mut bot = MemoryBot::new(6);
//! let outcome = play_round(&mut bot, &handle).await?;
//! println!("scored {}", outcome.score);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bot;
mod config;
mod driver;
mod feedback;
mod high_scores;
mod profile;

// Crate-level exports - Configuration
pub use config::{AppConfig, ConfigError};

// Crate-level exports - Driver
pub use driver::{DriverError, SessionCommand, SessionDriver, SessionHandle, WatchObserver};

// Crate-level exports - Collaborators
pub use feedback::TracingFeedback;
pub use high_scores::{
    ChannelHighScoreStore, HighScoreEntry, HighScoreError, HighScoreTable, spawn_high_score_writer,
};
pub use profile::{
    ChannelProfileReporter, InMemoryProfileStore, ProfileError, ProfileStats, ProfileStore,
    ProfileUpdate, spawn_profile_worker,
};

// Crate-level exports - Players
pub use bot::{MemoryBot, Player, play_round};
