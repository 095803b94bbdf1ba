//! Core domain types for tres en raya.

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::rules;

/// Mark a participant places on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Symbol {
    /// Symbol X (the room host, and always first in two-local mode).
    X,
    /// Symbol O.
    O,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

/// A single board cell.
///
/// Serialized as `null`, `"X"` or `"O"` so a board reads naturally inside a
/// shared document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Symbol>", into = "Option<Symbol>")]
pub enum Cell {
    /// Nobody has played here yet.
    #[default]
    Empty,
    /// Cell claimed by a symbol.
    Occupied(Symbol),
}

impl Cell {
    /// Returns the symbol in this cell, if any.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(symbol) => Some(symbol),
        }
    }
}

impl From<Option<Symbol>> for Cell {
    fn from(value: Option<Symbol>) -> Self {
        value.map_or(Cell::Empty, Cell::Occupied)
    }
}

impl From<Cell> for Option<Symbol> {
    fn from(cell: Cell) -> Self {
        cell.symbol()
    }
}

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// 3x3 board stored in row-major order (indices 0-8).
///
/// Boards are values: [`Board::apply`] returns a new board and leaves the
/// original untouched, so search code can branch freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from explicit cells.
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// Gets the cell at `index`, or `None` when off the board.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// True if `index` is on the board and unclaimed.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// All cells.
    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// Indices of unclaimed cells in ascending order.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELL_COUNT).filter(|&i| self.is_empty(i)).collect()
    }

    /// Number of claimed cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| **c != Cell::Empty).count()
    }

    /// Places `symbol` at `index`, returning the resulting board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IllegalMove`] when `index` is off the board or the
    /// cell is already claimed.
    pub fn apply(&self, index: usize, symbol: Symbol) -> Result<Board, GameError> {
        match self.get(index) {
            None => Err(GameError::illegal(index, "index is off the board")),
            Some(Cell::Occupied(_)) => Err(GameError::illegal(index, "cell is already occupied")),
            Some(Cell::Empty) => {
                let mut next = *self;
                next.cells[index] = Cell::Occupied(symbol);
                Ok(next)
            }
        }
    }

    /// Symbol holding three in a row, if any.
    pub fn winner(&self) -> Option<Symbol> {
        rules::winner(self)
    }

    /// True when every cell is claimed.
    pub fn is_full(&self) -> bool {
        rules::is_full(self)
    }

    /// Outcome if the game on this board is over.
    pub fn terminal(&self) -> Option<Outcome> {
        rules::terminal(self)
    }

    /// Formats the board for a terminal, numbering the free cells 1-9.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let index = row * 3 + col;
                match self.cells[index] {
                    Cell::Empty => result.push_str(&(index + 1).to_string()),
                    Cell::Occupied(symbol) => result.push_str(&symbol.to_string()),
                }
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A symbol completed a line.
    Winner(Symbol),
    /// The board filled up with no line.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Symbol> {
        match self {
            Outcome::Winner(symbol) => Some(*symbol),
            Outcome::Draw => None,
        }
    }

    /// Returns true if the game was a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(symbol) => write!(f, "{} wins", symbol),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}
