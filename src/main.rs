//! Tres en raya - terminal front end.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;
use tresenraya::AppConfig;
use tresenraya::play::{online_demo, play_local, self_play};
use tresenraya_core::MatchMode;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Solo { symbol, difficulty } => {
            let config = apply_overrides(config, symbol, difficulty);
            run_solo(config).await
        }
        Command::Duel => run_duel(config).await,
        Command::Selfplay { difficulty } => {
            let config = apply_overrides(config, None, difficulty);
            let mut stdout = std::io::stdout().lock();
            self_play(*config.difficulty(), config.ai_delay(), &mut stdout).await?;
            Ok(())
        }
        Command::OnlineDemo => {
            let mut stdout = std::io::stdout().lock();
            online_demo(&config, &mut stdout).await?;
            Ok(())
        }
    }
}

fn apply_overrides(
    config: AppConfig,
    symbol: Option<tresenraya_core::Symbol>,
    difficulty: Option<tresenraya_core::Difficulty>,
) -> AppConfig {
    let config = match symbol {
        Some(symbol) => config.with_symbol(symbol),
        None => config,
    };
    match difficulty {
        Some(difficulty) => config.with_difficulty(difficulty),
        None => config,
    }
}

/// Play against the search opponent
#[instrument(skip_all, fields(symbol = %config.symbol(), difficulty = %config.difficulty()))]
async fn run_solo(config: AppConfig) -> Result<()> {
    info!("Starting solo match");
    let mode = MatchMode::SoloVsSearch {
        human: *config.symbol(),
        difficulty: *config.difficulty(),
    };
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    play_local(mode, config.ai_delay(), &mut stdin, &mut stdout).await?;
    Ok(())
}

/// Two players at one terminal
#[instrument(skip_all)]
async fn run_duel(config: AppConfig) -> Result<()> {
    info!("Starting local duel");
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    play_local(MatchMode::TwoLocal, config.ai_delay(), &mut stdin, &mut stdout).await?;
    Ok(())
}
