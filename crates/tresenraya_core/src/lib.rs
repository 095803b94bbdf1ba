//! Tres en raya game engine.
//!
//! # Architecture
//!
//! - **Board model**: [`Board`], [`Cell`], [`Symbol`] and the pure rules in
//!   [`rules`].
//! - **Search opponent**: exact minimax in [`best_move`], plus
//!   [`random_move`] and the [`Difficulty`] policy that mixes them.
//! - **Local match controller**: [`LocalMatch`] runs a solo or two-player
//!   game and reports [`MatchEvent`]s.
//!
//! # Example
//!
//! ```
//! use tresenraya_core::{Board, Outcome, Symbol};
//!
//! let board = Board::new()
//!     .apply(0, Symbol::X)?
//!     .apply(1, Symbol::X)?
//!     .apply(2, Symbol::X)?;
//! assert_eq!(board.terminal(), Some(Outcome::Winner(Symbol::X)));
//! # Ok::<(), tresenraya_core::GameError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod controller;
mod error;
mod position;
pub mod rules;
mod search;
mod types;

pub use controller::{LocalMatch, MatchEvent, MatchMode, MatchStatus};
pub use error::GameError;
pub use position::Position;
pub use search::{Difficulty, MEDIUM_BEST_MOVE_PROBABILITY, best_move, random_move};
pub use types::{Board, CELL_COUNT, Cell, Outcome, Symbol};
