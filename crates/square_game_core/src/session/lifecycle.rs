//! Timer dispatch and round-end handling.

use tracing::{debug, info, instrument, warn};

use super::Session;
use crate::collaborators::Feedback;
use crate::error::GridError;
use crate::grid::CardShuffler;
use crate::rules;
use crate::scoring::{RoundOutcome, score_round};
use crate::timing::{Fired, Task, TimerKind};
use crate::types::{CardId, GameState};

impl<S: CardShuffler> Session<S> {
    /// Runs a fired timer unless it belongs to an earlier round.
    pub(super) fn dispatch(&mut self, fired: Fired) {
        if fired.generation != self.scheduler.generation() {
            debug!(
                task = ?fired.task,
                stale = fired.generation,
                current = self.scheduler.generation(),
                "Dropping stale timer"
            );
            return;
        }

        match fired.task {
            Task::EndPeek => self.end_peek(),
            Task::FlipBack { first, second } => self.flip_back(first, second),
            Task::CountdownTick => self.countdown_tick(),
            Task::AutoProgressTick => self.auto_progress_tick(),
        }
        self.publish();
    }

    fn end_peek(&mut self) {
        if self.state != GameState::Peeking {
            return;
        }
        self.engine.reveal_all(false);
        self.state = GameState::Playing;
        self.start_countdown();
        info!(time_remaining = self.stats.time_remaining, "Peek over, playing");
    }

    #[instrument(skip(self), fields(state = %self.state))]
    fn flip_back(&mut self, first: CardId, second: CardId) {
        if !self.engine.settle_mismatch(first, second) {
            return;
        }
        let Some(config) = self.level_config else {
            return;
        };
        if matches!(self.state, GameState::Playing | GameState::Paused)
            && rules::turns_exhausted(&config, &self.stats, self.extra_turns)
        {
            self.handle_game_over();
        }
    }

    fn countdown_tick(&mut self) {
        if self.state != GameState::Playing {
            self.scheduler.cancel(TimerKind::Countdown);
            return;
        }
        self.stats.time_remaining = self.stats.time_remaining.saturating_sub(1);
        if self.stats.time_remaining == 0 {
            self.handle_game_over();
        }
    }

    /// Starts the round countdown when the mode has one.
    ///
    /// After a pause the first tick comes once the rest of the interrupted
    /// second has elapsed.
    pub(super) fn start_countdown(&mut self) {
        let clocked = self.level_config.is_some_and(|c| c.mode().has_countdown());
        if !clocked || self.scheduler.is_scheduled(TimerKind::Countdown) {
            return;
        }
        let period = self.config.tick_interval();
        match self.countdown_carry.take() {
            Some(carry) => {
                self.scheduler.schedule_every_after(Task::CountdownTick, carry, period);
            }
            None => {
                self.scheduler.schedule_every(Task::CountdownTick, period);
            }
        }
    }

    /// Out of turns or time: spend a bonus life if one is allowed, else lose.
    #[instrument(skip(self), fields(lives = self.stats.bonus_lives, used = self.stats.bonus_life_used))]
    fn handle_game_over(&mut self) {
        let Some(config) = self.level_config else {
            return;
        };
        if self.stats.bonus_lives == 0 || self.stats.bonus_life_used {
            self.finish_round(false);
            return;
        }

        self.stats.bonus_lives -= 1;
        self.stats.bonus_life_used = true;
        if config.mode().has_countdown() {
            self.stats.time_remaining = self
                .stats
                .time_remaining
                .saturating_add(*self.config.bonus_seconds());
            if self.state == GameState::Playing {
                self.start_countdown();
            }
        } else {
            self.extra_turns = self.extra_turns.saturating_add(*self.config.bonus_turns());
        }
        self.notify(Feedback::BonusLife);
        info!(
            time_remaining = self.stats.time_remaining,
            extra_turns = self.extra_turns,
            "Bonus life consumed"
        );
    }

    /// Scores the round, reports it, and moves to the round-end screen.
    #[instrument(skip(self), fields(level = self.stats.current_level))]
    pub(super) fn finish_round(&mut self, is_win: bool) {
        let Some(config) = self.level_config else {
            return;
        };
        self.scheduler.cancel(TimerKind::Countdown);

        if is_win && rules::earns_perfect_bonus_life(&config, &self.stats) {
            self.stats.bonus_lives += 1;
            info!(lives = self.stats.bonus_lives, "Perfect game, bonus life earned");
        }

        let breakdown = score_round(&config, &self.stats);
        self.stats.total_score = breakdown.total();

        if is_win {
            self.state = GameState::Won;
            self.notify(Feedback::Win);
        } else {
            self.state = GameState::Lost;
            self.notify(Feedback::Loss);
        }
        info!(
            state = %self.state,
            score = self.stats.total_score,
            turns = self.stats.turns,
            matches = self.stats.matches_found,
            "Round finished"
        );

        let outcome = RoundOutcome::from_round(&config, &self.stats, is_win);
        if let Err(error) = self.collaborators.profile.report_round(&outcome) {
            warn!(%error, "Round report failed");
            self.notify(Feedback::Error);
        }
        self.last_outcome = Some(outcome);

        let score = self.stats.total_score;
        if self.collaborators.high_scores.is_high_score(score) {
            info!(score, "New high score awaiting a name");
            self.pending_high_score = Some(score);
        } else {
            self.start_auto_progress();
        }
    }

    /// Starts the round-end countdown, if enabled.
    pub(super) fn start_auto_progress(&mut self) {
        if !*self.config.auto_progress_enabled() || !self.state.is_round_over() {
            return;
        }
        self.auto_progress_remaining = Some(*self.config.auto_progress_secs());
        self.scheduler
            .schedule_every(Task::AutoProgressTick, self.config.tick_interval());
        debug!(secs = self.config.auto_progress_secs(), "Auto-progress started");
    }

    fn auto_progress_tick(&mut self) {
        let Some(remaining) = self.auto_progress_remaining else {
            self.scheduler.cancel(TimerKind::AutoProgress);
            return;
        };
        if !self.state.is_round_over() || self.pending_high_score.is_some() {
            self.scheduler.cancel(TimerKind::AutoProgress);
            self.auto_progress_remaining = None;
            return;
        }

        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.auto_progress_remaining = Some(remaining);
            return;
        }

        self.scheduler.cancel(TimerKind::AutoProgress);
        self.auto_progress_remaining = None;
        let result = if self.state == GameState::Won {
            info!("Auto-progress to next level");
            self.advance()
        } else {
            info!("Auto-progress retrying level");
            self.retry()
        };
        if let Err(error) = result {
            warn!(%error, "Auto-progress could not deal a new round");
            self.return_to_menu();
        }
    }

    /// Starts the level after the current one. Returns false in the menu.
    pub(super) fn advance(&mut self) -> Result<bool, GridError> {
        let Some(config) = self.level_config else {
            debug!("No level to advance from");
            return Ok(false);
        };
        self.start_round(config.level().saturating_add(1), self.requested_mode)?;
        Ok(true)
    }

    /// Starts the current level again. Returns false in the menu.
    pub(super) fn retry(&mut self) -> Result<bool, GridError> {
        let Some(config) = self.level_config else {
            debug!("No level to retry");
            return Ok(false);
        };
        self.start_round(config.level(), self.requested_mode)?;
        Ok(true)
    }
}
