//! Error types for the store and online sessions.

use derive_more::{Display, Error};
use tracing::instrument;
use tresenraya_core::{GameError, Symbol};

use crate::RoomCode;

/// Broad category of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreErrorKind {
    /// Backend unreachable or refused the call.
    #[display("unavailable")]
    Unavailable,
    /// The addressed document does not exist.
    #[display("not found")]
    NotFound,
    /// A document could not be encoded or decoded.
    #[display("malformed document")]
    Malformed,
}

/// Store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error ({}): {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Failure category.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Backend could not be reached.
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    /// Document is missing.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    /// Document failed to (de)serialize.
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Malformed, message)
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(format!("Serde error: {}", err))
    }
}

/// Everything an online operation can report to the player.
///
/// Store failures never surface raw: they are folded into one of these
/// kinds at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// Off-board index or occupied cell.
    #[display("Illegal move: {}", _0)]
    IllegalMove(GameError),

    /// Caller's symbol is not the one to move.
    #[display("Not your turn: you play {}, {} is to move", symbol, turn)]
    NotYourTurn {
        /// Symbol the caller tried to play.
        symbol: Symbol,
        /// Symbol the cached room says is to move.
        turn: Symbol,
    },

    /// No room under this code.
    #[display("Room {} does not exist", code)]
    RoomNotFound {
        /// Requested room.
        code: RoomCode,
    },

    /// Both participant slots are taken.
    #[display("Room {} is full", code)]
    RoomFull {
        /// Requested room.
        code: RoomCode,
    },

    /// The room exists but cannot accept a guest.
    #[display("Room {} cannot be joined: {}", code, reason)]
    RoomNotJoinable {
        /// Requested room.
        code: RoomCode,
        /// Why the join was refused.
        reason: &'static str,
    },

    /// The match in this room is over.
    #[display("Match is finished")]
    MatchFinished,

    /// The room expired through inactivity.
    #[display("Room has expired")]
    RoomExpired,

    /// Nobody has joined yet.
    #[display("Waiting for an opponent to join")]
    WaitingForOpponent,

    /// Text that is not a six-character `[A-Z0-9]` code.
    #[display("Invalid room code '{}'", input)]
    InvalidRoomCode {
        /// Rejected input.
        input: String,
    },

    /// Backend failure; the player may retry.
    #[display("Store unavailable: {}", message)]
    StoreUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// A shared document could not be read.
    #[display("Corrupt document: {}", message)]
    CorruptDocument {
        /// Description of the failure.
        message: String,
    },
}

impl SessionError {
    /// Converts a store failure on room `code` into a session error.
    pub fn from_store(err: StoreError, code: &RoomCode) -> Self {
        match err.kind {
            StoreErrorKind::Unavailable => Self::StoreUnavailable {
                message: err.message,
            },
            StoreErrorKind::NotFound => Self::RoomNotFound { code: code.clone() },
            StoreErrorKind::Malformed => Self::CorruptDocument {
                message: err.message,
            },
        }
    }

    /// Converts a store failure on a query that spans rooms.
    pub fn from_store_scan(err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::Unavailable | StoreErrorKind::NotFound => Self::StoreUnavailable {
                message: err.message,
            },
            StoreErrorKind::Malformed => Self::CorruptDocument {
                message: err.message,
            },
        }
    }
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        Self::IllegalMove(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_errors_keep_their_kind() {
        assert!(matches!(
            SessionError::from_store_scan(StoreError::malformed("bad row")),
            SessionError::CorruptDocument { .. }
        ));
        assert!(matches!(
            SessionError::from_store_scan(StoreError::unavailable("offline")),
            SessionError::StoreUnavailable { .. }
        ));
    }

    #[test]
    fn room_errors_name_the_room() {
        let code: RoomCode = "AB12CD".parse().unwrap();
        assert_eq!(
            SessionError::from_store(StoreError::not_found("rooms/AB12CD"), &code),
            SessionError::RoomNotFound { code }
        );
    }
}
