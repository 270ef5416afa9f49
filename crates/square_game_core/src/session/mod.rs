//! Session coordinator: the public face of the game core.
//!
//! A [`Session`] owns one player's game: the current round's cards and
//! counters, the timer scheduler, and the injected collaborators. All
//! operations run on the caller's thread in the order they are called;
//! timers only fire from [`Session::advance_time`].

mod lifecycle;

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::collaborators::{Collaborators, Feedback, StateObserver};
use crate::config::SessionConfig;
use crate::engine::{IgnoreReason, MatchEngine, Selection, TapOutcome};
use crate::error::GridError;
use crate::grid::{CardShuffler, RandomShuffler, generate_cards};
use crate::level::LevelConfig;
use crate::palette::ColorPalette;
use crate::rules;
use crate::scoring::RoundOutcome;
use crate::snapshot::Snapshot;
use crate::timing::{Scheduler, Task, TimerKind};
use crate::types::{Card, GameMode, GameState, GameStats};

/// Name recorded when a high score is submitted without one.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// One player's game session.
#[derive(Debug)]
pub struct Session<S: CardShuffler = RandomShuffler> {
    config: SessionConfig,
    palette: ColorPalette,
    shuffler: S,
    collaborators: Collaborators,
    scheduler: Scheduler,
    state: GameState,
    level_config: Option<LevelConfig>,
    requested_mode: Option<GameMode>,
    engine: MatchEngine,
    stats: GameStats,
    extra_turns: u32,
    countdown_carry: Option<Duration>,
    auto_progress_remaining: Option<u32>,
    pending_high_score: Option<u32>,
    last_outcome: Option<RoundOutcome>,
}

impl Session<RandomShuffler> {
    /// Creates a session in the menu, shuffling from OS entropy.
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        Self::with_shuffler(config, collaborators, RandomShuffler::from_os_rng())
    }
}

impl<S: CardShuffler> Session<S> {
    /// Creates a session in the menu with an explicit shuffler.
    #[instrument(skip_all)]
    pub fn with_shuffler(config: SessionConfig, collaborators: Collaborators, shuffler: S) -> Self {
        let stats = GameStats::for_level(1, *config.starting_bonus_lives());
        debug!(?config, "Session created");
        Self {
            config,
            palette: ColorPalette::default(),
            shuffler,
            collaborators,
            scheduler: Scheduler::new(),
            state: GameState::Menu,
            level_config: None,
            requested_mode: None,
            engine: MatchEngine::default(),
            stats,
            extra_turns: 0,
            countdown_carry: None,
            auto_progress_remaining: None,
            pending_high_score: None,
            last_outcome: None,
        }
    }

    /// Uses `palette` for rounds started from now on.
    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Registers another state observer.
    pub fn add_observer(&mut self, observer: impl StateObserver + 'static) {
        self.collaborators.observers.push(Box::new(observer));
    }

    /// Starts a fresh attempt at `level`, beginning with the peek window.
    ///
    /// With `mode` omitted, the level's default mode applies now and on every
    /// later advance or retry.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if the grid cannot be dealt; the session is left
    /// untouched in that case.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn start_new_game(&mut self, level: u32, mode: Option<GameMode>) -> Result<(), GridError> {
        self.start_round(level, mode)?;
        self.publish();
        Ok(())
    }

    /// Handles a tap on the card at `index`.
    ///
    /// Taps outside the playing phase, during a pending flip-back, or on
    /// flipped, matched, bonus or out-of-range cards are ignored.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn select_card(&mut self, index: usize) -> TapOutcome {
        let config = match (self.state, self.level_config) {
            (GameState::Playing, Some(config)) => config,
            _ => {
                debug!("Tap outside play ignored");
                return TapOutcome::Ignored(IgnoreReason::NotPlaying);
            }
        };

        let outcome = self
            .engine
            .select(index, config.mode(), &mut self.stats, &mut self.shuffler);

        match outcome {
            TapOutcome::Ignored(reason) => {
                debug!(%reason, "Tap ignored");
                return outcome;
            }
            TapOutcome::FirstPick { .. } => {
                self.notify(Feedback::Tap);
            }
            TapOutcome::Matched { .. } => {
                self.notify(Feedback::Tap);
                self.notify(Feedback::Match);
                if rules::is_won(&config, &self.stats) {
                    self.finish_round(true);
                }
            }
            TapOutcome::Mismatched { first, second } => {
                self.notify(Feedback::Tap);
                self.notify(Feedback::Mismatch);
                self.scheduler
                    .schedule_once(Task::FlipBack { first, second }, self.config.flip_back_delay());
            }
        }

        self.publish();
        outcome
    }

    /// Moves the virtual clock forward by `elapsed`, firing every timer that
    /// comes due on the way in order.
    #[instrument(skip(self), fields(now = ?self.scheduler.now()))]
    pub fn advance_time(&mut self, elapsed: Duration) {
        let until = self.scheduler.now() + elapsed;
        while let Some(fired) = self.scheduler.pop_due(until) {
            self.dispatch(fired);
        }
        self.scheduler.advance_to(until);
    }

    /// Starts the next level, keeping the requested mode.
    ///
    /// Ignored in the menu.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if the grid cannot be dealt.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn advance_to_next_level(&mut self) -> Result<(), GridError> {
        if self.advance()? {
            self.publish();
        }
        Ok(())
    }

    /// Restarts the current level with fresh cards and counters.
    ///
    /// Ignored in the menu.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if the grid cannot be dealt.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn restart_current_level(&mut self) -> Result<(), GridError> {
        if self.retry()? {
            self.publish();
        }
        Ok(())
    }

    /// Leaves the round: cancels every timer and clears the counters.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn return_to_menu(&mut self) {
        self.scheduler.cancel_all();
        self.scheduler.next_generation();
        self.state = GameState::Menu;
        self.level_config = None;
        self.requested_mode = None;
        self.engine = MatchEngine::default();
        self.stats = GameStats::for_level(1, *self.config.starting_bonus_lives());
        self.extra_turns = 0;
        self.countdown_carry = None;
        self.auto_progress_remaining = None;
        self.pending_high_score = None;
        self.last_outcome = None;
        info!("Returned to menu");
        self.publish();
    }

    /// Freezes a round in play. Returns whether the session paused.
    ///
    /// The part of the current countdown second already played is kept and
    /// carried over to [`Session::resume`].
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        self.state = GameState::Paused;
        self.countdown_carry = self.scheduler.remaining(TimerKind::Countdown);
        self.scheduler.cancel(TimerKind::Countdown);
        info!(time_remaining = self.stats.time_remaining, "Paused");
        self.publish();
        true
    }

    /// Continues a paused round. Returns whether the session resumed.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        self.state = GameState::Playing;
        self.start_countdown();
        info!(time_remaining = self.stats.time_remaining, "Resumed");
        self.publish();
        true
    }

    /// Stops the auto-progress countdown; the round-end screen stays.
    #[instrument(skip(self))]
    pub fn cancel_auto_progress(&mut self) {
        self.scheduler.cancel(TimerKind::AutoProgress);
        if self.auto_progress_remaining.take().is_some() {
            debug!("Auto-progress cancelled");
            self.publish();
        }
    }

    /// Records the pending high score under `name`, then starts
    /// auto-progress. Returns whether a score was pending.
    ///
    /// A blank name is recorded as [`DEFAULT_PLAYER_NAME`].
    #[instrument(skip(self))]
    pub fn submit_high_score(&mut self, name: &str) -> bool {
        let Some(score) = self.pending_high_score.take() else {
            return false;
        };
        let name = match name.trim() {
            "" => DEFAULT_PLAYER_NAME,
            trimmed => trimmed,
        };
        let level = self.stats.current_level;
        match self.collaborators.high_scores.record_high_score(name, score, level) {
            Ok(()) => info!(name, score, level, "High score recorded"),
            Err(error) => {
                warn!(%error, "High score could not be recorded");
                self.notify(Feedback::Error);
            }
        }
        self.start_auto_progress();
        self.publish();
        true
    }

    /// Skips recording the pending high score, then starts auto-progress.
    /// Returns whether a score was pending.
    #[instrument(skip(self))]
    pub fn dismiss_high_score(&mut self) -> bool {
        if self.pending_high_score.take().is_none() {
            return false;
        }
        debug!("High score dismissed");
        self.start_auto_progress();
        self.publish();
        true
    }

    /// Session phase.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Cards in grid order; empty in the menu.
    pub fn cards(&self) -> &[Card] {
        self.engine.cards()
    }

    /// Round counters.
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Rules of the current level.
    pub fn level_config(&self) -> Option<&LevelConfig> {
        self.level_config.as_ref()
    }

    /// Mode the current attempt was requested with.
    pub fn requested_mode(&self) -> Option<GameMode> {
        self.requested_mode
    }

    /// Match-engine selection state.
    pub fn selection(&self) -> Selection {
        self.engine.selection()
    }

    /// True while a mismatched pair waits to flip back.
    pub fn is_resolving(&self) -> bool {
        self.engine.is_resolving()
    }

    /// Session tuning.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Virtual time of the next pending timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// Whether a timer of `kind` is pending.
    pub fn is_timer_scheduled(&self, kind: TimerKind) -> bool {
        self.scheduler.is_scheduled(kind)
    }

    /// Current round generation.
    pub fn generation(&self) -> u64 {
        self.scheduler.generation()
    }

    /// Turns granted on top of the cap by a consumed bonus life.
    pub fn extra_turns(&self) -> u32 {
        self.extra_turns
    }

    /// Seconds until auto-progress, while counting down.
    pub fn auto_progress_remaining(&self) -> Option<u32> {
        self.auto_progress_remaining
    }

    /// Score waiting for a name.
    pub fn pending_high_score(&self) -> Option<u32> {
        self.pending_high_score
    }

    /// Outcome of the most recent finished round.
    pub fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.last_outcome.as_ref()
    }

    /// Clones the observable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            cards: self.engine.cards().to_vec(),
            stats: self.stats.clone(),
            level_config: self.level_config,
            selection: self.engine.selection(),
            auto_progress_remaining: self.auto_progress_remaining,
            pending_high_score: self.pending_high_score,
            last_outcome: self.last_outcome.clone(),
            generation: self.scheduler.generation(),
        }
    }

    /// Deals a new round and enters the peek window.
    fn start_round(&mut self, level: u32, mode: Option<GameMode>) -> Result<(), GridError> {
        let level_config = LevelConfig::resolve(level, mode);
        let cards = generate_cards(level_config.grid_size(), &self.palette, &mut self.shuffler)?;

        self.scheduler.cancel_all();
        let generation = self.scheduler.next_generation();

        self.engine = MatchEngine::new(cards, level_config.pair_count());
        self.engine.reveal_all(true);
        self.stats = GameStats::for_level(level_config.level(), *self.config.starting_bonus_lives());
        self.stats.time_remaining = level_config.max_time().unwrap_or(0);
        self.extra_turns = 0;
        self.countdown_carry = None;
        self.auto_progress_remaining = None;
        self.pending_high_score = None;
        self.last_outcome = None;
        self.level_config = Some(level_config);
        self.requested_mode = mode;
        self.state = GameState::Peeking;
        self.scheduler
            .schedule_once(Task::EndPeek, self.config.peek_duration());

        info!(
            level = level_config.level(),
            mode = %level_config.mode(),
            grid = level_config.grid_size(),
            generation,
            "Round started"
        );
        Ok(())
    }

    fn notify(&mut self, feedback: Feedback) {
        self.collaborators.feedback.notify(feedback);
    }

    fn publish(&mut self) {
        if self.collaborators.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.collaborators.observers {
            observer.on_state_changed(&snapshot);
        }
    }
}
