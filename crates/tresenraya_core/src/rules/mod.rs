//! Game rules for tres en raya.
//!
//! Pure functions over a [`Board`](crate::Board). Rules are separated from
//! board storage so the search opponent and both match drivers share one
//! definition of "over".

mod draw;
mod win;

pub use draw::is_full;
pub use win::{LINES, winner};

use crate::{Board, Outcome};
use tracing::instrument;

/// Evaluates whether the game on `board` is over.
///
/// `None` means play continues. A win is checked before fullness, so a move
/// that fills the last cell and completes a line is a win, not a draw.
#[instrument(level = "trace")]
pub fn terminal(board: &Board) -> Option<Outcome> {
    if let Some(symbol) = winner(board) {
        Some(Outcome::Winner(symbol))
    } else if is_full(board) {
        Some(Outcome::Draw)
    } else {
        None
    }
}
