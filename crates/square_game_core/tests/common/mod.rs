//! Shared fixtures for session tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use square_game_core::{
    CardShuffler, CollaboratorError, Collaborators, Feedback, FeedbackSink, GameMode,
    HighScoreStore, ProfileReporter, RoundOutcome, Session, SessionConfig, Snapshot,
    StateObserver,
};

/// Reverses instead of shuffling, so dealt layouts are known.
///
/// A 3x3 grid deals colors `[3, 3, 2, 2, bonus, 1, 1, 0, 0]`.
pub struct ReverseShuffler;

impl CardShuffler for ReverseShuffler {
    fn shuffle_slice<T>(&mut self, items: &mut [T]) {
        items.reverse();
    }
}

/// Matching index pairs of the reversed 3x3 layout.
pub const PAIRS_3X3: [(usize, usize); 4] = [(0, 1), (2, 3), (5, 6), (7, 8)];

pub const PEEK: Duration = Duration::from_millis(3000);
pub const FLIP_BACK: Duration = Duration::from_millis(600);
pub const SECOND: Duration = Duration::from_secs(1);

pub fn session(collaborators: Collaborators) -> Session<ReverseShuffler> {
    Session::with_shuffler(SessionConfig::default(), collaborators, ReverseShuffler)
}

pub fn session_with(config: SessionConfig, collaborators: Collaborators) -> Session<ReverseShuffler> {
    Session::with_shuffler(config, collaborators, ReverseShuffler)
}

/// Starts `level` and waits out the peek window.
pub fn start_playing(session: &mut Session<ReverseShuffler>, level: u32, mode: Option<GameMode>) {
    session.start_new_game(level, mode).expect("deal grid");
    session.advance_time(PEEK);
}

pub fn tap_pair(session: &mut Session<ReverseShuffler>, first: usize, second: usize) {
    session.select_card(first);
    session.select_card(second);
}

/// Taps a mismatched pair and lets it flip back.
pub fn miss(session: &mut Session<ReverseShuffler>, first: usize, second: usize) {
    tap_pair(session, first, second);
    session.advance_time(FLIP_BACK);
}

#[derive(Clone, Default)]
pub struct FeedbackLog(pub Arc<Mutex<Vec<Feedback>>>);

impl FeedbackLog {
    pub fn events(&self) -> Vec<Feedback> {
        self.0.lock().expect("lock").clone()
    }
}

impl FeedbackSink for FeedbackLog {
    fn notify(&mut self, feedback: Feedback) {
        self.0.lock().expect("lock").push(feedback);
    }
}

#[derive(Clone, Default)]
pub struct ReportLog {
    pub reports: Arc<Mutex<Vec<RoundOutcome>>>,
    pub fail: bool,
}

impl ProfileReporter for ReportLog {
    fn report_round(&mut self, outcome: &RoundOutcome) -> Result<(), CollaboratorError> {
        self.reports.lock().expect("lock").push(outcome.clone());
        if self.fail {
            return Err(CollaboratorError::new("profile service unreachable"));
        }
        Ok(())
    }
}

/// Accepts every score and records names.
#[derive(Clone, Default)]
pub struct EagerHighScores {
    pub entries: Arc<Mutex<Vec<(String, u32, u32)>>>,
    pub fail: bool,
}

impl HighScoreStore for EagerHighScores {
    fn is_high_score(&self, _score: u32) -> bool {
        true
    }

    fn record_high_score(&mut self, name: &str, score: u32, level: u32) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::new("disk full"));
        }
        self.entries
            .lock()
            .expect("lock")
            .push((name.to_string(), score, level));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct SnapshotLog(pub Arc<Mutex<Vec<Snapshot>>>);

impl SnapshotLog {
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.0.lock().expect("lock").clone()
    }
}

impl StateObserver for SnapshotLog {
    fn on_state_changed(&mut self, snapshot: &Snapshot) {
        self.0.lock().expect("lock").push(snapshot.clone());
    }
}
