//! Command-line interface for square_game.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use square_game_core::GameMode;

/// Square Game - memory matching with a simulated player
#[derive(Parser, Debug)]
#[command(name = "square_game")]
#[command(about = "Memory matching card game engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Let the memory bot play rounds in real time
    Play {
        /// Level to start on
        #[arg(short, long, default_value = "1")]
        level: u32,

        /// Game mode (score, time, difficult); level default if omitted
        #[arg(short, long)]
        mode: Option<GameMode>,

        /// Seed for dealing and for the bot's guesses
        #[arg(long)]
        seed: Option<u64>,

        /// Number of card colors the bot can remember
        #[arg(long, default_value = "6")]
        memory_slots: usize,

        /// Rounds to play
        #[arg(short, long, default_value = "3")]
        rounds: u32,

        /// Pause before each tap, in milliseconds
        #[arg(long, default_value = "300")]
        think_ms: u64,

        /// Path to the configuration file
        #[arg(short, long, default_value = "square_game.toml")]
        config: PathBuf,
    },

    /// Print the level table
    Levels {
        /// Game mode; level default if omitted
        #[arg(short, long)]
        mode: Option<GameMode>,

        /// Last level to print
        #[arg(long, default_value = "12")]
        up_to: u32,
    },

    /// Print the local high-score table
    Scores {
        /// Path to the configuration file
        #[arg(short, long, default_value = "square_game.toml")]
        config: PathBuf,

        /// Remove every entry
        #[arg(long)]
        clear: bool,
    },
}
