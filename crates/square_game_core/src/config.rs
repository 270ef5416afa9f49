//! Session tuning: timer lengths and bonus-life grants.

use std::time::Duration;

use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Timer lengths and recovery grants for a [`Session`](crate::Session).
///
/// Every field has a default, so a partial TOML table deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct SessionConfig {
    /// How long all cards stay revealed before play, in milliseconds.
    peek_duration_ms: u64,

    /// How long a mismatched pair stays face up, in milliseconds.
    flip_back_delay_ms: u64,

    /// Period of the round countdown and auto-progress ticks, in milliseconds.
    countdown_tick_ms: u64,

    /// Seconds before a finished round moves on by itself.
    auto_progress_secs: u32,

    /// Whether finished rounds move on by themselves.
    auto_progress_enabled: bool,

    /// Extra turns granted by a bonus life in Score mode.
    bonus_turns: u32,

    /// Extra seconds granted by a bonus life in the clocked modes.
    bonus_seconds: u32,

    /// Bonus lives at the start of every attempt.
    starting_bonus_lives: u32,
}

fn default_peek_duration_ms() -> u64 {
    3000
}

fn default_flip_back_delay_ms() -> u64 {
    600
}

fn default_countdown_tick_ms() -> u64 {
    1000
}

fn default_auto_progress_secs() -> u32 {
    5
}

fn default_bonus_turns() -> u32 {
    2
}

fn default_bonus_seconds() -> u32 {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            peek_duration_ms: default_peek_duration_ms(),
            flip_back_delay_ms: default_flip_back_delay_ms(),
            countdown_tick_ms: default_countdown_tick_ms(),
            auto_progress_secs: default_auto_progress_secs(),
            auto_progress_enabled: true,
            bonus_turns: default_bonus_turns(),
            bonus_seconds: default_bonus_seconds(),
            starting_bonus_lives: 1,
        }
    }
}

impl SessionConfig {
    /// Peek window as a [`Duration`].
    pub fn peek_duration(&self) -> Duration {
        Duration::from_millis(self.peek_duration_ms)
    }

    /// Flip-back delay as a [`Duration`].
    pub fn flip_back_delay(&self) -> Duration {
        Duration::from_millis(self.flip_back_delay_ms)
    }

    /// Tick period as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_timings() {
        let config = SessionConfig::default();
        assert_eq!(config.peek_duration(), Duration::from_secs(3));
        assert_eq!(config.flip_back_delay(), Duration::from_millis(600));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(*config.auto_progress_secs(), 5);
        assert!(*config.auto_progress_enabled());
        assert_eq!(*config.bonus_turns(), 2);
        assert_eq!(*config.bonus_seconds(), 10);
        assert_eq!(*config.starting_bonus_lives(), 1);
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"bonus_seconds": 15, "auto_progress_enabled": false}"#)
                .expect("valid config");
        assert_eq!(*config.bonus_seconds(), 15);
        assert!(!*config.auto_progress_enabled());
        assert_eq!(*config.peek_duration_ms(), 3000);
    }

    #[test]
    fn builder_setters() {
        let config = SessionConfig::default()
            .with_starting_bonus_lives(0)
            .with_peek_duration_ms(10);
        assert_eq!(*config.starting_bonus_lives(), 0);
        assert_eq!(config.peek_duration(), Duration::from_millis(10));
    }
}
