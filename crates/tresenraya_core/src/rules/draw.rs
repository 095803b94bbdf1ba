//! Draw detection.

use crate::{Board, Cell};
use tracing::instrument;

/// Checks if every cell is claimed.
///
/// A full board with no winner is a draw.
#[instrument(level = "trace")]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|c| *c != Cell::Empty)
}
