//! Win detection.

use crate::{Board, Cell, Symbol};
use tracing::instrument;

/// The eight winning lines: rows, then columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the symbol holding three in a row.
///
/// Lines are scanned in [`LINES`] order and the first complete one wins.
#[instrument(level = "trace")]
pub fn winner(board: &Board) -> Option<Symbol> {
    let cells = board.cells();
    LINES.iter().find_map(|&[a, b, c]| match cells[a] {
        Cell::Occupied(symbol) if cells[b] == cells[a] && cells[c] == cells[a] => Some(symbol),
        _ => None,
    })
}
