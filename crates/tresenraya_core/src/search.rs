//! Scripted opponent: exhaustive minimax plus a random fallback.
//!
//! The 3x3 board is small enough (at most 9 plies) to solve exactly, so
//! there is no depth limit, no heuristic and no alpha-beta pruning. Every
//! recursion works on a fresh [`Board`] value, nothing is mutated and
//! restored.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Board, GameError, Outcome, Symbol};

/// Chance that [`Difficulty::Medium`] plays the solved move.
pub const MEDIUM_BEST_MOVE_PROBABILITY: f64 = 0.7;

/// Finds the optimal cell for `to_move`.
///
/// Terminal positions score +1 when `to_move` has won, -1 when the opponent
/// has, and 0 for a draw. Ties go to the lowest cell index.
///
/// # Errors
///
/// Returns [`GameError::NoLegalMove`] when the board is full.
#[instrument(skip(board), fields(occupied = board.occupied_count()))]
pub fn best_move(board: &Board, to_move: Symbol) -> Result<usize, GameError> {
    let mut best: Option<(usize, i8)> = None;

    for index in board.empty_cells() {
        let Ok(child) = board.apply(index, to_move) else {
            continue;
        };
        let score = minimax(&child, to_move, to_move.opponent());
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    let (index, score) = best.ok_or(GameError::NoLegalMove)?;
    debug!(index, score, "Search chose move");
    Ok(index)
}

/// Value of `board` for `me`, with `to_move` about to play.
fn minimax(board: &Board, me: Symbol, to_move: Symbol) -> i8 {
    match board.terminal() {
        Some(Outcome::Winner(symbol)) if symbol == me => 1,
        Some(Outcome::Winner(_)) => -1,
        Some(Outcome::Draw) => 0,
        None => {
            let scores = board
                .empty_cells()
                .into_iter()
                .filter_map(|index| board.apply(index, to_move).ok())
                .map(|child| minimax(&child, me, to_move.opponent()));

            if to_move == me {
                scores.max().unwrap_or(0)
            } else {
                scores.min().unwrap_or(0)
            }
        }
    }
}

/// Picks a uniformly random empty cell.
///
/// # Errors
///
/// Returns [`GameError::NoLegalMove`] when the board is full.
pub fn random_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Result<usize, GameError> {
    board
        .empty_cells()
        .choose(rng)
        .copied()
        .ok_or(GameError::NoLegalMove)
}

/// How hard the scripted opponent plays.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// Always random.
    Easy,
    /// Solved move most of the time, random otherwise.
    #[default]
    Medium,
    /// Always the solved move.
    Hard,
}

impl Difficulty {
    /// Chooses a move for `to_move` under this difficulty.
    ///
    /// `Medium` is stochastic: repeated calls on the same board may differ.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoLegalMove`] when the board is full.
    #[instrument(skip(board, rng))]
    pub fn choose_move<R: Rng + ?Sized>(
        self,
        board: &Board,
        to_move: Symbol,
        rng: &mut R,
    ) -> Result<usize, GameError> {
        match self {
            Difficulty::Easy => random_move(board, rng),
            Difficulty::Hard => best_move(board, to_move),
            Difficulty::Medium => {
                if rng.gen_bool(MEDIUM_BEST_MOVE_PROBABILITY) {
                    best_move(board, to_move)
                } else {
                    random_move(board, rng)
                }
            }
        }
    }
}
