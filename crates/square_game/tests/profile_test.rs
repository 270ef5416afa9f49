//! Tests for the profile store and the channel reporter.

use std::sync::Arc;

use square_game::{InMemoryProfileStore, ProfileStats, ProfileStore, spawn_profile_worker};
use square_game_core::{AchievementKind, GameMode, ProfileReporter, RoundOutcome};

fn outcome(mode: GameMode, level: u32, is_win: bool, score: u32) -> RoundOutcome {
    RoundOutcome {
        score,
        level,
        mode,
        is_win,
        turns_used: 6,
        time_remaining: 0,
        matches_found: if is_win { 4 } else { 2 },
        used_bonus_life: false,
        is_perfect: false,
        achievements: Vec::new(),
    }
}

#[test]
fn streaks_reset_on_loss() {
    let mut stats = ProfileStats::default();
    for is_win in [true, true, true, false, true] {
        stats.apply(&outcome(GameMode::Score, 1, is_win, 100));
    }
    assert_eq!(*stats.games_played(), 5);
    assert_eq!(*stats.wins(), 4);
    assert_eq!(*stats.losses(), 1);
    assert_eq!(*stats.current_streak(), 1);
    assert_eq!(*stats.best_streak(), 3);
    assert_eq!(*stats.total_score(), 500);
    assert_eq!(*stats.total_matches(), 18);
}

#[tokio::test]
async fn first_win_unlocks_once() {
    let store = InMemoryProfileStore::new();
    let lost = store
        .record_round(&outcome(GameMode::Score, 1, false, 50))
        .await
        .expect("record");
    assert!(lost.newly_unlocked.is_empty());

    let won = store
        .record_round(&outcome(GameMode::Score, 1, true, 500))
        .await
        .expect("record");
    assert_eq!(won.newly_unlocked, [AchievementKind::FirstWin]);

    let again = store
        .record_round(&outcome(GameMode::Score, 2, true, 500))
        .await
        .expect("record");
    assert!(again.newly_unlocked.is_empty());
    assert!(store.unlocked().await.expect("unlocked").contains("first_win"));
}

#[tokio::test]
async fn round_and_cumulative_achievements_merge_in_catalog_order() {
    let store = InMemoryProfileStore::new();
    let mut time_win = outcome(GameMode::Time, 10, true, 10_000);
    time_win.achievements = vec![AchievementKind::TimeWizard];

    let update = store.record_round(&time_win).await.expect("record");
    assert_eq!(
        update.newly_unlocked,
        [
            AchievementKind::FirstWin,
            AchievementKind::LevelMaster,
            AchievementKind::ScoreHunter,
            AchievementKind::TimeWizard,
        ]
    );
    assert_eq!(*update.stats.time_mode_wins(), 1);
}

#[tokio::test]
async fn speedster_after_five_time_wins() {
    let store = InMemoryProfileStore::new();
    let mut unlocked = Vec::new();
    for _ in 0..5 {
        let update = store
            .record_round(&outcome(GameMode::Time, 1, true, 100))
            .await
            .expect("record");
        unlocked.extend(update.newly_unlocked);
    }
    assert!(unlocked.contains(&AchievementKind::Speedster));

    let mut store_stats = store.stats().await.expect("stats");
    assert_eq!(*store_stats.time_mode_wins(), 5);
    store_stats.apply(&outcome(GameMode::Difficult, 1, true, 100));
    assert_eq!(*store_stats.difficult_mode_wins(), 1);
}

#[tokio::test]
async fn worker_drains_queue_after_reporter_drops() {
    let store = Arc::new(InMemoryProfileStore::new());
    let (mut reporter, worker) = spawn_profile_worker(store.clone(), 4);

    reporter
        .report_round(&outcome(GameMode::Score, 1, true, 650))
        .expect("queued");
    reporter
        .report_round(&outcome(GameMode::Score, 2, false, 100))
        .expect("queued");
    drop(reporter);
    worker.await.expect("worker");

    let stats = store.stats().await.expect("stats");
    assert_eq!(*stats.games_played(), 2);
    assert_eq!(*stats.highest_level(), 2);
}

#[tokio::test]
async fn full_queue_is_reported_not_blocking() {
    let store = Arc::new(InMemoryProfileStore::new());
    let (mut reporter, worker) = spawn_profile_worker(store.clone(), 1);

    // The worker cannot run until this task yields, so the second send finds
    // the single slot taken.
    reporter
        .report_round(&outcome(GameMode::Score, 1, true, 650))
        .expect("queued");
    let err = reporter
        .report_round(&outcome(GameMode::Score, 1, true, 650))
        .expect_err("queue full");
    assert!(err.message.contains("full"));

    drop(reporter);
    worker.await.expect("worker");
    assert_eq!(*store.stats().await.expect("stats").games_played(), 1);
}
