//! Contracts with the world outside the session.
//!
//! The session receives its collaborators at construction and calls them
//! synchronously from its own event stream. None of them may block for
//! long: implementations that do real I/O hand the work to a background
//! task. Failures are returned as [`CollaboratorError`] and only logged.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::CollaboratorError;
use crate::scoring::RoundOutcome;
use crate::snapshot::Snapshot;

/// Receives the outcome of every finished round (profile/leaderboard side).
pub trait ProfileReporter: Send {
    /// Reports one finished round.
    fn report_round(&mut self, outcome: &RoundOutcome) -> Result<(), CollaboratorError>;
}

/// Local high-score table.
pub trait HighScoreStore: Send {
    /// Whether `score` would enter the table.
    fn is_high_score(&self, score: u32) -> bool;

    /// Records a named entry.
    fn record_high_score(
        &mut self,
        name: &str,
        score: u32,
        level: u32,
    ) -> Result<(), CollaboratorError>;
}

/// Best-effort accessibility and haptic notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feedback {
    /// A card was flipped.
    Tap,
    /// A pair was found.
    Match,
    /// Two cards did not match.
    Mismatch,
    /// The round was won.
    Win,
    /// The round was lost.
    Loss,
    /// An outward report failed.
    Error,
    /// A bonus life was consumed.
    BonusLife,
}

/// Sink for [`Feedback`] notifications.
pub trait FeedbackSink: Send {
    /// Fire-and-forget notification.
    fn notify(&mut self, feedback: Feedback);
}

/// Receives a fresh snapshot after every state change.
pub trait StateObserver: Send {
    /// Called with the state after the change.
    fn on_state_changed(&mut self, snapshot: &Snapshot);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProfileReporter;

impl ProfileReporter for NoopProfileReporter {
    fn report_round(&mut self, _outcome: &RoundOutcome) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// A store that never holds a high score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHighScoreStore;

impl HighScoreStore for NoopHighScoreStore {
    fn is_high_score(&self, _score: u32) -> bool {
        false
    }

    fn record_high_score(
        &mut self,
        _name: &str,
        _score: u32,
        _level: u32,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Ignores feedback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {
    fn notify(&mut self, _feedback: Feedback) {}
}

/// The injected collaborators of one session.
pub struct Collaborators {
    pub(crate) profile: Box<dyn ProfileReporter>,
    pub(crate) high_scores: Box<dyn HighScoreStore>,
    pub(crate) feedback: Box<dyn FeedbackSink>,
    pub(crate) observers: Vec<Box<dyn StateObserver>>,
}

impl Collaborators {
    /// Replaces the profile reporter.
    pub fn with_profile(mut self, profile: impl ProfileReporter + 'static) -> Self {
        self.profile = Box::new(profile);
        self
    }

    /// Replaces the high-score store.
    pub fn with_high_scores(mut self, store: impl HighScoreStore + 'static) -> Self {
        self.high_scores = Box::new(store);
        self
    }

    /// Replaces the feedback sink.
    pub fn with_feedback(mut self, feedback: impl FeedbackSink + 'static) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    /// Adds a state observer.
    pub fn with_observer(mut self, observer: impl StateObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            profile: Box::new(NoopProfileReporter),
            high_scores: Box::new(NoopHighScoreStore),
            feedback: Box::new(NoopFeedback),
            observers: Vec::new(),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
