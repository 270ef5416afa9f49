//! Phase transitions, timers, and collaborator handling.

mod common;

use std::time::Duration;

use common::*;
use square_game_core::{
    Collaborators, Feedback, GameMode, GameState, IgnoreReason, SessionConfig, TapOutcome,
    TimerKind,
};

#[test]
fn peek_reveals_then_hides_cards() {
    let mut session = session(Collaborators::default());
    session.start_new_game(1, None).expect("deal grid");
    assert_eq!(session.state(), GameState::Peeking);
    assert!(session.cards().iter().all(|c| c.is_flipped));
    assert_eq!(
        session.select_card(0),
        TapOutcome::Ignored(IgnoreReason::NotPlaying)
    );

    session.advance_time(PEEK - SECOND);
    assert_eq!(session.state(), GameState::Peeking);
    session.advance_time(SECOND);
    assert_eq!(session.state(), GameState::Playing);

    let face_up: Vec<usize> = session
        .cards()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_flipped)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(face_up, [4]);
    // Score mode runs no countdown.
    assert!(!session.is_timer_scheduled(TimerKind::Countdown));
}

#[test]
fn taps_are_ignored_while_resolving_and_on_bonus() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 1, None);

    assert_eq!(
        session.select_card(4),
        TapOutcome::Ignored(IgnoreReason::BonusCard)
    );
    assert_eq!(
        session.select_card(40),
        TapOutcome::Ignored(IgnoreReason::OutOfRange)
    );

    tap_pair(&mut session, 0, 2);
    assert!(session.is_resolving());
    assert_eq!(
        session.select_card(5),
        TapOutcome::Ignored(IgnoreReason::Resolving)
    );
    assert_eq!(session.stats().turns, 1);

    session.advance_time(FLIP_BACK);
    assert!(!session.is_resolving());
    assert!(!session.cards()[0].is_flipped && !session.cards()[2].is_flipped);
    assert_eq!(session.select_card(5), TapOutcome::FirstPick { index: 5 });
}

#[test]
fn restart_drops_pending_flip_back() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 1, None);
    let generation = session.generation();

    tap_pair(&mut session, 0, 2);
    session.restart_current_level().expect("deal grid");
    assert!(session.generation() > generation);
    assert!(!session.is_timer_scheduled(TimerKind::FlipBack));

    session.advance_time(FLIP_BACK);
    assert_eq!(session.state(), GameState::Peeking);
    assert!(session.cards().iter().all(|c| c.is_flipped));
    assert_eq!(session.stats().turns, 0);
}

#[test]
fn return_to_menu_stops_every_timer() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 2, Some(GameMode::Time));
    tap_pair(&mut session, 0, 2);

    session.return_to_menu();
    assert_eq!(session.state(), GameState::Menu);
    assert!(session.cards().is_empty());
    assert!(session.next_due().is_none());
    assert_eq!(session.stats().turns, 0);

    session.advance_time(SECOND * 60);
    assert_eq!(session.state(), GameState::Menu);

    // Menu has nothing to advance or retry.
    session.advance_to_next_level().expect("no-op");
    session.restart_current_level().expect("no-op");
    assert_eq!(session.state(), GameState::Menu);
}

#[test]
fn pause_freezes_the_countdown() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 1, Some(GameMode::Time));
    session.advance_time(SECOND * 5);
    assert_eq!(session.stats().time_remaining, 25);

    assert!(session.pause());
    assert!(!session.pause());
    assert_eq!(session.state(), GameState::Paused);
    session.advance_time(SECOND * 10);
    assert_eq!(session.stats().time_remaining, 25);
    assert_eq!(
        session.select_card(0),
        TapOutcome::Ignored(IgnoreReason::NotPlaying)
    );

    assert!(session.resume());
    assert!(!session.resume());
    session.advance_time(SECOND);
    assert_eq!(session.stats().time_remaining, 24);
}

#[test]
fn pause_keeps_the_partial_second() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 1, Some(GameMode::Time));
    for _ in 0..10 {
        session.advance_time(Duration::from_millis(900));
        assert!(session.pause());
        assert!(session.resume());
    }
    assert_eq!(session.stats().time_remaining, 21);
}

#[test]
fn repeated_pausing_cannot_stop_the_clock() {
    let config = SessionConfig::default().with_auto_progress_enabled(false);
    let mut session = session_with(config, Collaborators::default());
    start_playing(&mut session, 1, Some(GameMode::Time));
    for _ in 0..100 {
        session.advance_time(Duration::from_millis(900));
        session.pause();
        session.resume();
    }
    assert_eq!(session.state(), GameState::Lost);
    assert_eq!(session.stats().time_remaining, 0);
    assert!(session.stats().bonus_life_used);
}

#[test]
fn huge_level_round_scores_without_overflow() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 100_000_000, Some(GameMode::Time));
    session.advance_time(SECOND * 41);
    assert_eq!(session.state(), GameState::Lost);
    assert_eq!(session.stats().total_score, u32::MAX);
    assert_eq!(session.last_outcome().expect("outcome").score, u32::MAX);
}

#[test]
fn advancing_past_the_last_level_stays_there() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, u32::MAX, Some(GameMode::Score));
    session.advance_to_next_level().expect("deal grid");
    assert_eq!(session.state(), GameState::Peeking);
    assert_eq!(session.stats().current_level, u32::MAX);
    assert_eq!(session.level_config().expect("level").max_turns(), Some(1));
}

#[test]
fn won_round_auto_progresses_to_next_level() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 1, None);
    for (first, second) in PAIRS_3X3 {
        tap_pair(&mut session, first, second);
    }
    assert_eq!(session.auto_progress_remaining(), Some(5));

    session.advance_time(SECOND * 4);
    assert_eq!(session.state(), GameState::Won);
    assert_eq!(session.auto_progress_remaining(), Some(1));

    session.advance_time(SECOND);
    assert_eq!(session.state(), GameState::Peeking);
    assert_eq!(session.stats().current_level, 2);
    assert_eq!(session.stats().bonus_lives, 1);
    assert_eq!(session.stats().total_score, 0);
    assert_eq!(session.level_config().expect("level").max_turns(), Some(9));
}

#[test]
fn lost_round_auto_progress_retries() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 3, Some(GameMode::Difficult));
    session.advance_time(SECOND * 55);
    assert_eq!(session.state(), GameState::Lost);

    session.advance_time(SECOND * 5);
    assert_eq!(session.state(), GameState::Peeking);
    assert_eq!(session.stats().current_level, 3);
    assert_eq!(session.requested_mode(), Some(GameMode::Difficult));
    assert_eq!(session.stats().time_remaining, 45);
}

#[test]
fn cancelled_auto_progress_waits_for_the_player() {
    let mut session = session(Collaborators::default());
    start_playing(&mut session, 1, None);
    for (first, second) in PAIRS_3X3 {
        tap_pair(&mut session, first, second);
    }
    session.cancel_auto_progress();
    session.cancel_auto_progress();
    session.advance_time(SECOND * 30);
    assert_eq!(session.state(), GameState::Won);

    session.advance_to_next_level().expect("deal grid");
    assert_eq!(session.stats().current_level, 2);
}

#[test]
fn disabled_auto_progress_stays_on_result() {
    let config = SessionConfig::default().with_auto_progress_enabled(false);
    let mut session = session_with(config, Collaborators::default());
    start_playing(&mut session, 1, None);
    for (first, second) in PAIRS_3X3 {
        tap_pair(&mut session, first, second);
    }
    assert_eq!(session.auto_progress_remaining(), None);
    session.advance_time(SECOND * 30);
    assert_eq!(session.state(), GameState::Won);
}

#[test]
fn default_progression_switches_mode_after_level_seven() {
    let mut session = session(Collaborators::default());
    session.start_new_game(7, None).expect("deal grid");
    assert_eq!(session.level_config().expect("level").mode(), GameMode::Score);

    session.advance_to_next_level().expect("deal grid");
    let level = session.level_config().expect("level");
    assert_eq!(level.level(), 8);
    assert_eq!(level.mode(), GameMode::Time);
    assert_eq!(session.stats().time_remaining, 30);
}

#[test]
fn high_score_waits_for_a_name() {
    let store = EagerHighScores::default();
    let entries = store.entries.clone();
    let mut session = session(Collaborators::default().with_high_scores(store));
    start_playing(&mut session, 1, None);
    for (first, second) in PAIRS_3X3 {
        tap_pair(&mut session, first, second);
    }

    assert_eq!(session.pending_high_score(), Some(650));
    assert_eq!(session.auto_progress_remaining(), None);
    session.advance_time(SECOND * 10);
    assert_eq!(session.state(), GameState::Won);

    assert!(session.submit_high_score("   "));
    assert!(!session.submit_high_score("again"));
    assert_eq!(
        entries.lock().expect("lock").as_slice(),
        [("Player".to_string(), 650, 1)]
    );
    assert_eq!(session.auto_progress_remaining(), Some(5));
}

#[test]
fn dismissed_high_score_is_not_recorded() {
    let store = EagerHighScores::default();
    let entries = store.entries.clone();
    let mut session = session(Collaborators::default().with_high_scores(store));
    start_playing(&mut session, 1, None);
    for (first, second) in PAIRS_3X3 {
        tap_pair(&mut session, first, second);
    }

    assert!(session.dismiss_high_score());
    assert!(!session.dismiss_high_score());
    assert!(entries.lock().expect("lock").is_empty());
    assert_eq!(session.pending_high_score(), None);
    assert_eq!(session.auto_progress_remaining(), Some(5));
}

#[test]
fn collaborator_failures_leave_round_intact() {
    let feedback = FeedbackLog::default();
    let reporter = ReportLog {
        fail: true,
        ..ReportLog::default()
    };
    let reports = reporter.reports.clone();
    let store = EagerHighScores {
        fail: true,
        ..EagerHighScores::default()
    };
    let collaborators = Collaborators::default()
        .with_feedback(feedback.clone())
        .with_profile(reporter)
        .with_high_scores(store);

    let mut session = session(collaborators);
    start_playing(&mut session, 1, None);
    for (first, second) in PAIRS_3X3 {
        tap_pair(&mut session, first, second);
    }
    assert!(session.submit_high_score("Ada"));

    assert_eq!(session.state(), GameState::Won);
    assert_eq!(session.stats().total_score, 650);
    assert_eq!(reports.lock().expect("lock").len(), 1);

    let events = feedback.events();
    assert_eq!(events.iter().filter(|f| **f == Feedback::Error).count(), 2);
    assert_eq!(events.iter().filter(|f| **f == Feedback::Match).count(), 4);
    assert_eq!(events.iter().filter(|f| **f == Feedback::Tap).count(), 8);
    assert!(events.contains(&Feedback::Win));
}

#[test]
fn round_outcome_is_reported_once() {
    let reporter = ReportLog::default();
    let reports = reporter.reports.clone();
    let mut session = session(Collaborators::default().with_profile(reporter));
    start_playing(&mut session, 2, Some(GameMode::Time));
    session.advance_time(SECOND * 40);

    let reports = reports.lock().expect("lock");
    assert_eq!(reports.len(), 1);
    let outcome = &reports[0];
    assert!(!outcome.is_win);
    assert_eq!(outcome.level, 2);
    assert_eq!(outcome.mode, GameMode::Time);
    assert_eq!(outcome.score, 100);
    assert!(outcome.used_bonus_life);
}

#[test]
fn observers_see_every_change() {
    let log = SnapshotLog::default();
    let mut session = session(Collaborators::default());
    session.add_observer(log.clone());

    start_playing(&mut session, 1, None);
    session.select_card(0);

    let states: Vec<GameState> = log.snapshots().iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        [GameState::Peeking, GameState::Playing, GameState::Playing]
    );
    let last = log.snapshots().last().cloned().expect("snapshot");
    assert_eq!(last, session.snapshot());
    assert_eq!(last.grid_size(), 3);
}

#[test]
fn bonus_life_feedback_fires_once() {
    let feedback = FeedbackLog::default();
    let mut session = session(Collaborators::default().with_feedback(feedback.clone()));
    start_playing(&mut session, 1, Some(GameMode::Time));
    session.advance_time(SECOND * 40);

    let events = feedback.events();
    assert_eq!(events, [Feedback::BonusLife, Feedback::Loss]);
}
