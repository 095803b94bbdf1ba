//! Command-line interface for tresenraya.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tresenraya_core::{Difficulty, Symbol};

/// Tres en raya - tic-tac-toe in the terminal
#[derive(Parser, Debug)]
#[command(name = "tresenraya")]
#[command(about = "Tic-tac-toe against a search opponent, a friend, or a remote room", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play against the search opponent
    Solo {
        /// Symbol you play (X or O); that symbol moves first
        #[arg(short, long)]
        symbol: Option<Symbol>,

        /// Opponent strength (easy, medium, hard)
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },

    /// Two players at the same terminal, X first
    Duel,

    /// Watch the search opponent play itself
    Selfplay {
        /// Strength of both sides (easy, medium, hard)
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },

    /// Two in-process players share a room over an in-memory store
    OnlineDemo,
}
