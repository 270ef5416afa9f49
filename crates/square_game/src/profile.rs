//! Player profile: cumulative statistics, streaks and achievements.
//!
//! The session reports finished rounds through [`ChannelProfileReporter`],
//! which never blocks: outcomes are queued to a background task that feeds
//! a [`ProfileStore`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use square_game_core::{
    AchievementKind, CollaboratorError, GameMode, ProfileReporter, RoundOutcome, achievement,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Cumulative counters for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ProfileStats {
    /// Rounds finished.
    games_played: u32,
    /// Rounds won.
    wins: u32,
    /// Rounds lost.
    losses: u32,
    /// Sum of all round scores.
    total_score: u64,
    /// Highest level played.
    highest_level: u32,
    /// Pairs found across all rounds.
    total_matches: u64,
    /// Time-mode wins.
    time_mode_wins: u32,
    /// Difficult-mode wins.
    difficult_mode_wins: u32,
    /// Consecutive wins up to now.
    current_streak: u32,
    /// Longest run of consecutive wins.
    best_streak: u32,
}

impl ProfileStats {
    /// Folds one round into the counters.
    pub fn apply(&mut self, outcome: &RoundOutcome) {
        self.games_played += 1;
        self.total_score += u64::from(outcome.score);
        self.total_matches += u64::from(outcome.matches_found);
        self.highest_level = self.highest_level.max(outcome.level);

        if outcome.is_win {
            self.wins += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
            match outcome.mode {
                GameMode::Time => self.time_mode_wins += 1,
                GameMode::Difficult => self.difficult_mode_wins += 1,
                GameMode::Score => {}
            }
        } else {
            self.losses += 1;
            self.current_streak = 0;
        }
    }

    /// Cumulative achievements whose thresholds these counters meet.
    pub fn earned_achievements(&self) -> Vec<AchievementKind> {
        let reached = |kind: AchievementKind, value: u64| {
            (value >= u64::from(achievement(kind).requirement)).then_some(kind)
        };
        [
            reached(AchievementKind::FirstWin, self.wins.into()),
            reached(AchievementKind::Speedster, self.time_mode_wins.into()),
            reached(AchievementKind::MarathonRunner, self.games_played.into()),
            reached(AchievementKind::LevelMaster, self.highest_level.into()),
            reached(AchievementKind::ScoreHunter, self.total_score),
            reached(AchievementKind::MatchMaker, self.total_matches),
            reached(AchievementKind::DifficultChampion, self.difficult_mode_wins.into()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Result of recording a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Counters after the round.
    pub stats: ProfileStats,
    /// Achievements unlocked by this round, in catalog order.
    pub newly_unlocked: Vec<AchievementKind>,
}

/// Where profile data lives.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Records a finished round.
    async fn record_round(&self, outcome: &RoundOutcome) -> Result<ProfileUpdate, ProfileError>;

    /// Current counters.
    async fn stats(&self) -> Result<ProfileStats, ProfileError>;

    /// Ids of unlocked achievements.
    async fn unlocked(&self) -> Result<HashSet<String>, ProfileError>;
}

#[derive(Debug, Default)]
struct ProfileState {
    stats: ProfileStats,
    unlocked: HashSet<String>,
}

/// Profile kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    state: Mutex<ProfileState>,
}

impl InMemoryProfileStore {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    #[instrument(skip(self, outcome), fields(level = outcome.level, win = outcome.is_win))]
    async fn record_round(&self, outcome: &RoundOutcome) -> Result<ProfileUpdate, ProfileError> {
        let mut state = self.state.lock().await;
        state.stats.apply(outcome);

        let mut candidates = outcome.achievements.clone();
        candidates.extend(state.stats.earned_achievements());

        let mut newly_unlocked = Vec::new();
        for kind in candidates {
            if state.unlocked.insert(kind.id().to_string()) {
                newly_unlocked.push(kind);
            }
        }
        newly_unlocked.sort_by_key(|kind| {
            square_game_core::CATALOG
                .iter()
                .position(|a| a.kind == *kind)
                .unwrap_or(usize::MAX)
        });

        if !newly_unlocked.is_empty() {
            info!(?newly_unlocked, "Achievements unlocked");
        }
        debug!(games = state.stats.games_played, streak = state.stats.current_streak, "Profile updated");
        Ok(ProfileUpdate {
            stats: state.stats.clone(),
            newly_unlocked,
        })
    }

    async fn stats(&self) -> Result<ProfileStats, ProfileError> {
        Ok(self.state.lock().await.stats.clone())
    }

    async fn unlocked(&self) -> Result<HashSet<String>, ProfileError> {
        Ok(self.state.lock().await.unlocked.clone())
    }
}

/// Queues round outcomes for a background profile worker.
#[derive(Debug, Clone)]
pub struct ChannelProfileReporter {
    outcomes: mpsc::Sender<RoundOutcome>,
}

impl ChannelProfileReporter {
    /// Wraps the sending half of a worker queue.
    pub fn new(outcomes: mpsc::Sender<RoundOutcome>) -> Self {
        Self { outcomes }
    }
}

impl ProfileReporter for ChannelProfileReporter {
    fn report_round(&mut self, outcome: &RoundOutcome) -> Result<(), CollaboratorError> {
        self.outcomes
            .try_send(outcome.clone())
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => CollaboratorError::new("Profile queue is full"),
                mpsc::error::TrySendError::Closed(_) => {
                    CollaboratorError::new("Profile worker has stopped")
                }
            })
    }
}

/// Spawns a task that records every queued outcome into `store`.
///
/// The task ends once every reporter clone is dropped and the queue drains.
#[instrument(skip(store))]
pub fn spawn_profile_worker(
    store: Arc<dyn ProfileStore>,
    capacity: usize,
) -> (ChannelProfileReporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<RoundOutcome>(capacity.max(1));
    let handle = tokio::spawn(async move {
        while let Some(outcome) = rx.recv().await {
            match store.record_round(&outcome).await {
                Ok(update) => debug!(
                    games = update.stats.games_played,
                    unlocked = update.newly_unlocked.len(),
                    "Round saved to profile"
                ),
                Err(error) => warn!(%error, "Failed to save round to profile"),
            }
        }
        debug!("Profile worker stopped");
    });
    (ChannelProfileReporter::new(tx), handle)
}

/// Profile store error.
#[derive(Debug, Clone, Display, Error)]
#[display("Profile error: {} at {}:{}", message, file, line)]
pub struct ProfileError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProfileError {
    /// Creates a new profile error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
