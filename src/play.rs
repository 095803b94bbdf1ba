//! Terminal front ends: local play, self-play and the online demo.
//!
//! Input and output are passed in so the loops can be driven from tests.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, instrument, warn};
use tresenraya_core::{Difficulty, LocalMatch, MatchEvent, MatchMode, Outcome, Position};
use tresenraya_online::store::MemoryStore;
use tresenraya_online::{
    OnlineSession, Participant, Role, RoomCode, RoomLifecycle, SessionEvent, SystemClock,
};

use crate::AppConfig;

/// Formats an outcome for the player.
pub fn describe_outcome(outcome: Outcome) -> String {
    match outcome {
        Outcome::Winner(symbol) => format!("{} wins!", symbol),
        Outcome::Draw => "It's a draw.".to_string(),
    }
}

fn position_label(index: usize) -> &'static str {
    Position::from_index(index).map_or("?", |p| p.label())
}

/// Runs a human match on `input`, printing to `output`.
///
/// Returns `None` if the player quit (`q`) or input ended before the match
/// finished.
#[instrument(skip(input, output))]
pub async fn play_local<R: BufRead, W: Write>(
    mode: MatchMode,
    ai_delay: Duration,
    input: &mut R,
    output: &mut W,
) -> Result<Option<Outcome>> {
    let mut game = LocalMatch::new(mode);
    info!(turn = %game.turn(), "Local match started");

    loop {
        writeln!(output, "\n{}\n", game.board().display())?;
        write!(output, "{} to move (1-9 or cell name, q to quit): ", game.turn())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            info!("Input closed, leaving match");
            return Ok(None);
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            info!("Player quit");
            return Ok(None);
        }

        let Some(position) = Position::parse_input(line) else {
            writeln!(output, "'{}' is not a cell. Try 1-9 or e.g. top-left.", line)?;
            continue;
        };

        let events = match game.select_cell(position.to_index()) {
            Ok(events) => events,
            Err(e) => {
                writeln!(output, "{}", e)?;
                continue;
            }
        };

        for event in events {
            match event {
                MatchEvent::Placed { index, symbol } => {
                    if Some(symbol) == mode.search_symbol() {
                        tokio::time::sleep(ai_delay).await;
                    }
                    writeln!(output, "{} plays {}", symbol, position_label(index))?;
                }
                MatchEvent::Finished(outcome) => {
                    writeln!(output, "\n{}\n", game.board().display())?;
                    writeln!(output, "{}", describe_outcome(outcome))?;
                    return Ok(Some(outcome));
                }
                other => debug!(event = ?other, "Match event"),
            }
        }
    }
}

/// Lets the search opponent play both sides.
#[instrument(skip(output))]
pub async fn self_play<W: Write>(
    difficulty: Difficulty,
    ai_delay: Duration,
    output: &mut W,
) -> Result<Outcome> {
    let mut game = LocalMatch::new(MatchMode::TwoLocal);

    loop {
        let index = difficulty.choose_move(game.board(), game.turn(), &mut rand::thread_rng())?;
        for event in game.select_cell(index)? {
            match event {
                MatchEvent::Placed { index, symbol } => {
                    tokio::time::sleep(ai_delay).await;
                    writeln!(output, "{} plays {}", symbol, position_label(index))?;
                }
                MatchEvent::Finished(outcome) => {
                    writeln!(output, "\n{}\n", game.board().display())?;
                    writeln!(output, "{}", describe_outcome(outcome))?;
                    return Ok(outcome);
                }
                _ => {}
            }
        }
    }
}

/// Two in-process participants play a full match through a shared
/// [`MemoryStore`], chatting as they go. Prints the guest's view.
#[instrument(skip_all)]
pub async fn online_demo<W: Write>(config: &AppConfig, output: &mut W) -> Result<Outcome> {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = RoomLifecycle::new(
        store.clone(),
        Arc::new(SystemClock),
        config.lifecycle_config(),
    );

    let ana = Participant::new("host-ana", "Ana");
    let luis = Participant::new("guest-luis", "Luis");

    let code = lifecycle.create_room(&ana).await?;
    let link = code.join_link(config.join_base_url());
    writeln!(output, "{} opened room {}: {}", ana.display_name, code, link)?;

    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    let mut host = OnlineSession::attach(store.clone(), code.clone(), Role::Host, ana, host_tx).await?;

    let joined = RoomCode::from_join_link(&link)?;
    if lifecycle.lookup(&joined).await?.is_none() {
        return Err(anyhow!("room {} vanished before the guest arrived", joined));
    }
    lifecycle.join_room(&joined, &luis).await?;
    writeln!(output, "{} joined with the link", luis.display_name)?;

    let (guest_tx, mut guest_rx) = mpsc::unbounded_channel();
    let mut guest = OnlineSession::attach(store.clone(), joined, Role::Guest, luis, guest_tx).await?;
    host.sync();

    host.send_chat("Good luck!").await?;
    guest.sync();

    let difficulty = *config.difficulty();
    let outcome = loop {
        let (mover, watcher) = if host.is_my_turn() {
            (&mut host, &mut guest)
        } else if guest.is_my_turn() {
            (&mut guest, &mut host)
        } else {
            break None;
        };

        let board = *mover
            .room()
            .ok_or_else(|| anyhow!("session lost its room"))?
            .board();
        let symbol = mover.symbol();
        let index = difficulty.choose_move(&board, symbol, &mut rand::thread_rng())?;

        let finished = mover.submit_move(index, symbol).await?;
        if let Err(e) = mover
            .send_chat(&format!("{} for me.", position_label(index)))
            .await
        {
            warn!(error = %e, "Chat narration failed");
        }
        watcher.sync();
        mover.sync();

        drain_quietly(&mut host_rx);
        narrate(&mut guest_rx, output)?;

        if finished.is_some() {
            break finished;
        }
    };

    let outcome = outcome
        .or_else(|| host.room().and_then(|r| r.outcome()))
        .ok_or_else(|| anyhow!("match in room {} did not finish", code))?;
    writeln!(output, "{}", describe_outcome(outcome))?;

    host.leave().await;
    guest.leave().await;
    let swept = lifecycle.sweep().await?;
    info!(%code, swept, "Online demo complete");
    Ok(outcome)
}

fn narrate<W: Write>(events: &mut UnboundedReceiver<SessionEvent>, output: &mut W) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::BoardUpdated(board) => writeln!(output, "\n{}\n", board.display())?,
            SessionEvent::ChatAppended { message, .. } => {
                writeln!(output, "[{}] {}", message.author_name, message.text)?
            }
            SessionEvent::OpponentJoined(opponent) => {
                writeln!(output, "Playing against {}", opponent.display_name)?
            }
            SessionEvent::Error(e) => writeln!(output, "! {}", e)?,
            other => debug!(event = ?other, "Session event"),
        }
    }
    Ok(())
}

fn drain_quietly(events: &mut UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Error(e) = event {
            warn!(error = %e, "Host session reported an error");
        }
    }
}

