//! Errors raised by the board and the local match controller.

/// Error that can occur when validating or applying a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GameError {
    /// The index is off the board or the cell is already claimed.
    #[display("Illegal move at {}: {}", index, reason)]
    IllegalMove {
        /// Requested cell index.
        index: usize,
        /// Why the move was refused.
        reason: &'static str,
    },

    /// The board has no empty cell left to choose.
    #[display("No legal move available")]
    NoLegalMove,

    /// The match already ended; reset before playing again.
    #[display("Match is already over")]
    MatchOver,

    /// The search opponent is to move, not the human.
    #[display("It's the opponent's turn")]
    NotHumanTurn,
}

impl GameError {
    pub(crate) fn illegal(index: usize, reason: &'static str) -> Self {
        Self::IllegalMove { index, reason }
    }
}
