//! Square Game - command-line entry point.

#![warn(missing_docs)]

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use square_game::{
    AppConfig, HighScoreTable, InMemoryProfileStore, MemoryBot, ProfileStore, SessionDriver,
    TracingFeedback, play_round, spawn_high_score_writer, spawn_profile_worker,
};
use square_game_core::{
    Collaborators, GameMode, LevelConfig, RandomShuffler, Session, achievement_statuses,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            level,
            mode,
            seed,
            memory_slots,
            rounds,
            think_ms,
            config,
        } => {
            let config = AppConfig::load_or_default(&config)?;
            init_tracing(config.log_filter());
            run_play(&config, level, mode, seed, memory_slots, rounds, think_ms).await
        }
        Command::Levels { mode, up_to } => {
            init_tracing("warn");
            print_levels(mode, up_to);
            Ok(())
        }
        Command::Scores { config, clear } => {
            let config = AppConfig::load_or_default(&config)?;
            init_tracing(config.log_filter());
            show_scores(&config, clear)
        }
    }
}

fn init_tracing(fallback: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the memory bot for `rounds` rounds against the real-time driver.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(config))]
async fn run_play(
    config: &AppConfig,
    level: u32,
    mode: Option<GameMode>,
    seed: Option<u64>,
    memory_slots: usize,
    rounds: u32,
    think_ms: u64,
) -> Result<()> {
    let table = HighScoreTable::open(config.high_score_path(), *config.high_score_capacity())?;
    let store = Arc::new(InMemoryProfileStore::new());
    let (reporter, worker) = spawn_profile_worker(store.clone(), 32);
    let (high_scores, writer) = spawn_high_score_writer(table, 32);

    let collaborators = Collaborators::default()
        .with_profile(reporter)
        .with_high_scores(high_scores)
        .with_feedback(TracingFeedback);
    let shuffler = seed.map_or_else(RandomShuffler::from_os_rng, RandomShuffler::seeded);
    let session = Session::with_shuffler(config.session().clone(), collaborators, shuffler);
    let handle = SessionDriver::spawn(session, config.driver_tick());

    let bot = match seed {
        Some(seed) => MemoryBot::seeded(memory_slots, seed.wrapping_add(1)),
        None => MemoryBot::new(memory_slots),
    };
    let mut bot = bot
        .with_name(config.player_name().clone())
        .with_think_time(Duration::from_millis(think_ms));

    info!(level, ?mode, rounds, "Starting play");
    handle.start_new_game(level, mode).await?;

    for round in 1..=rounds {
        let outcome = play_round(&mut bot, &handle).await?;
        let earned = if outcome.achievements.is_empty() {
            String::new()
        } else {
            let ids: Vec<&str> = outcome.achievements.iter().map(|kind| kind.id()).collect();
            format!("  [{}]", ids.join(", "))
        };
        println!(
            "round {:>2}  level {:>2}  {:<14} {:<4}  score {:>5}  turns {:>2}  time left {:>2}s{}",
            round,
            outcome.level,
            outcome.mode.label(),
            if outcome.is_win { "won" } else { "lost" },
            outcome.score,
            outcome.turns_used,
            outcome.time_remaining,
            earned,
        );

        if handle.snapshot().pending_high_score.is_some() {
            handle.submit_high_score(config.player_name()).await?;
            println!("          new high score for {}", config.player_name());
        }
        handle.cancel_auto_progress().await?;

        if round == rounds {
            break;
        }
        if outcome.is_win {
            handle.advance_to_next_level().await?;
        } else {
            handle.restart_current_level().await?;
        }
    }

    // Dropping the session closes both queues so the workers can finish.
    drop(handle.shutdown().await?);
    worker.await?;
    writer.await?;

    let stats = store.stats().await?;
    println!();
    println!(
        "played {}  won {}  lost {}  best streak {}  total score {}",
        stats.games_played(),
        stats.wins(),
        stats.losses(),
        stats.best_streak(),
        stats.total_score()
    );
    let unlocked = store.unlocked().await?;
    for status in achievement_statuses(&unlocked).iter().filter(|s| s.unlocked) {
        println!(
            "achievement: {} - {}",
            status.achievement.title, status.achievement.description
        );
    }

    show_table(&HighScoreTable::open(
        config.high_score_path(),
        *config.high_score_capacity(),
    )?);
    Ok(())
}

fn print_levels(mode: Option<GameMode>, up_to: u32) {
    println!("level  mode            grid  pairs  turns  time");
    for level in 1..=up_to.max(1) {
        let config = LevelConfig::resolve(level, mode);
        println!(
            "{:>5}  {:<14}  {}x{}  {:>5}  {:>5}  {:>4}",
            config.level(),
            config.mode().label(),
            config.grid_size(),
            config.grid_size(),
            config.pair_count(),
            config.max_turns().map_or("-".to_string(), |t| t.to_string()),
            config
                .max_time()
                .map_or("-".to_string(), |t| format!("{}s", t)),
        );
    }
}

#[instrument(skip(config))]
fn show_scores(config: &AppConfig, clear: bool) -> Result<()> {
    let path: &Path = config.high_score_path();
    let mut table = HighScoreTable::open(path, *config.high_score_capacity())?;
    if clear {
        table.clear()?;
        println!("high scores cleared");
        return Ok(());
    }
    show_table(&table);
    Ok(())
}

fn show_table(table: &HighScoreTable) {
    println!();
    if table.entries().is_empty() {
        println!("no high scores yet");
        return;
    }
    println!("rank  name             score  level  date");
    for (rank, entry) in table.entries().iter().enumerate() {
        println!(
            "{:>4}  {:<15}  {:>5}  {:>5}  {}",
            rank + 1,
            entry.name(),
            entry.score(),
            entry.level(),
            entry.date().format("%Y-%m-%d")
        );
    }
}
