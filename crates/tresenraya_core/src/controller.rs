//! Local match controller.
//!
//! Drives one board through a full game, either against the search opponent
//! or between two people sharing the same terminal. Every operation returns
//! the events a front end needs to redraw; the controller never touches I/O.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{Board, Difficulty, GameError, Outcome, Symbol};

/// Who sits across the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum MatchMode {
    /// One human against the search opponent.
    #[display("solo ({} vs {} search)", human, difficulty)]
    SoloVsSearch {
        /// Symbol the human plays; it also moves first.
        human: Symbol,
        /// Strength of the opponent.
        difficulty: Difficulty,
    },
    /// Two humans taking turns locally. X always opens.
    #[display("two local players")]
    TwoLocal,
}

impl MatchMode {
    /// Symbol that opens a new match in this mode.
    pub fn starting_symbol(&self) -> Symbol {
        match self {
            MatchMode::SoloVsSearch { human, .. } => *human,
            MatchMode::TwoLocal => Symbol::X,
        }
    }

    /// Symbol the search opponent plays, if any.
    pub fn search_symbol(&self) -> Option<Symbol> {
        match self {
            MatchMode::SoloVsSearch { human, .. } => Some(human.opponent()),
            MatchMode::TwoLocal => None,
        }
    }
}

/// Match status. Moves only out of `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Still being played.
    Active,
    /// Somebody completed a line.
    Won(Symbol),
    /// Board filled without a line.
    Drawn,
}

impl From<Outcome> for MatchStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner(symbol) => MatchStatus::Won(symbol),
            Outcome::Draw => MatchStatus::Drawn,
        }
    }
}

/// Render-relevant change produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// A symbol was placed.
    Placed {
        /// Cell index.
        index: usize,
        /// Symbol placed.
        symbol: Symbol,
    },
    /// The board after the latest change.
    BoardUpdated(Board),
    /// It is now this symbol's turn.
    TurnChanged(Symbol),
    /// The match ended.
    Finished(Outcome),
    /// The board was cleared for a new match.
    Reset,
}

/// A single local match.
#[derive(Debug, Clone)]
pub struct LocalMatch {
    mode: MatchMode,
    board: Board,
    turn: Symbol,
    status: MatchStatus,
    history: Vec<usize>,
}

impl LocalMatch {
    /// Starts a fresh match.
    #[instrument]
    pub fn new(mode: MatchMode) -> Self {
        info!(%mode, "Starting local match");
        Self {
            mode,
            board: Board::new(),
            turn: mode.starting_symbol(),
            status: MatchStatus::Active,
            history: Vec::new(),
        }
    }

    /// Match mode.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Symbol to move next.
    pub fn turn(&self) -> Symbol {
        self.turn
    }

    /// Match status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Cells played so far, in order.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Handles a cell selection from the person whose turn it is.
    ///
    /// In solo mode the opponent's reply is computed and applied before this
    /// returns, so the events cover both moves.
    ///
    /// # Errors
    ///
    /// - [`GameError::MatchOver`] once the match has ended.
    /// - [`GameError::NotHumanTurn`] if the search opponent is to move.
    /// - [`GameError::IllegalMove`] for an off-board or occupied cell.
    #[instrument(skip(self), fields(turn = %self.turn))]
    pub fn select_cell(&mut self, index: usize) -> Result<Vec<MatchEvent>, GameError> {
        if self.status != MatchStatus::Active {
            warn!(index, "Selection after the match ended");
            return Err(GameError::MatchOver);
        }
        if self.mode.search_symbol() == Some(self.turn) {
            warn!(index, "Selection during the opponent's turn");
            return Err(GameError::NotHumanTurn);
        }

        let mut events = self.place(index)?;

        if let (MatchMode::SoloVsSearch { difficulty, .. }, MatchStatus::Active) =
            (self.mode, self.status)
            && self.mode.search_symbol() == Some(self.turn)
        {
            let reply = difficulty.choose_move(&self.board, self.turn, &mut rand::thread_rng())?;
            debug!(reply, %difficulty, "Opponent replies");
            events.extend(self.place(reply)?);
        }

        Ok(events)
    }

    /// Clears the board and hands the first move back per the mode's policy.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> Vec<MatchEvent> {
        info!(mode = %self.mode, "Resetting local match");
        self.board = Board::new();
        self.turn = self.mode.starting_symbol();
        self.status = MatchStatus::Active;
        self.history.clear();
        vec![
            MatchEvent::Reset,
            MatchEvent::BoardUpdated(self.board),
            MatchEvent::TurnChanged(self.turn),
        ]
    }

    fn place(&mut self, index: usize) -> Result<Vec<MatchEvent>, GameError> {
        let symbol = self.turn;
        self.board = self.board.apply(index, symbol)?;
        self.history.push(index);

        let mut events = vec![
            MatchEvent::Placed { index, symbol },
            MatchEvent::BoardUpdated(self.board),
        ];

        match self.board.terminal() {
            Some(outcome) => {
                info!(%outcome, moves = self.history.len(), "Local match finished");
                self.status = outcome.into();
                events.push(MatchEvent::Finished(outcome));
            }
            None => {
                self.turn = symbol.opponent();
                events.push(MatchEvent::TurnChanged(self.turn));
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_local_always_opens_with_x() {
        let game = LocalMatch::new(MatchMode::TwoLocal);
        assert_eq!(game.turn(), Symbol::X);
    }

    #[test]
    fn solo_opens_with_human_symbol() {
        let game = LocalMatch::new(MatchMode::SoloVsSearch {
            human: Symbol::O,
            difficulty: Difficulty::Hard,
        });
        assert_eq!(game.turn(), Symbol::O);
    }

    #[test]
    fn illegal_move_leaves_state_alone() {
        let mut game = LocalMatch::new(MatchMode::TwoLocal);
        game.select_cell(4).unwrap();
        let before = game.board().to_owned();
        assert!(matches!(game.select_cell(4), Err(GameError::IllegalMove { .. })));
        assert_eq!(game.board(), &before);
        assert_eq!(game.turn(), Symbol::O);
    }
}
