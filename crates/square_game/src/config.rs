//! Application configuration loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use square_game_core::SessionConfig;
use tracing::{debug, info, instrument};

/// Settings for the `square_game` binary.
///
/// ```toml
/// player_name = "Ada"
/// high_score_path = "scores.json"
///
/// [session]
/// peek_duration_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name recorded with high scores.
    player_name: String,

    /// Where the high-score table is kept.
    high_score_path: PathBuf,

    /// Entries kept in the high-score table.
    high_score_capacity: usize,

    /// Tracing filter used when `RUST_LOG` is unset.
    log_filter: String,

    /// How often the driver advances the session clock, in milliseconds.
    driver_tick_ms: u64,

    /// Session timers and bonus grants.
    session: SessionConfig,
}

#[instrument]
fn default_player_name() -> String {
    square_game_core::DEFAULT_PLAYER_NAME.to_string()
}

#[instrument]
fn default_high_score_path() -> PathBuf {
    PathBuf::from("square_game_scores.json")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player_name: default_player_name(),
            high_score_path: default_high_score_path(),
            high_score_capacity: 10,
            log_filter: "info".to_string(),
            driver_tick_ms: 50,
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(player = %config.player_name, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Returns a copy with a different player name.
    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    /// Driver tick as a [`Duration`], at least one millisecond.
    pub fn driver_tick(&self) -> Duration {
        Duration::from_millis(self.driver_tick_ms.max(1))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
