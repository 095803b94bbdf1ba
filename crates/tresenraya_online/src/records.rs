//! Append-only records kept beside a room: moves, chat and finished games.
//!
//! None of these are authoritative; the room document is. They exist for
//! history and narration, so writing them is best-effort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tresenraya_core::{Board, Outcome, Symbol};

use crate::store::{Document, StoredDocument, fields, server_timestamp};
use crate::{Participant, RoomStatus, StoreError};

/// Most chat messages replayed to a session when it attaches.
pub const CHAT_HISTORY_LIMIT: usize = 50;

/// One accepted move, as written by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// Cell played.
    pub cell_index: usize,
    /// Symbol placed.
    pub symbol: Symbol,
    /// Author's participant id.
    pub author_id: String,
    /// Author's display name.
    pub author_name: String,
    /// 1 for the first move of a match, up to 9.
    pub sequence_number: usize,
    /// Server time of the write.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl MoveRecord {
    /// Document for a new record, stamped by the store.
    pub fn new_document(
        cell_index: usize,
        symbol: Symbol,
        author: &Participant,
        sequence_number: usize,
    ) -> Document {
        fields(json!({
            "cellIndex": cell_index,
            "symbol": symbol,
            "authorId": author.id,
            "authorName": author.display_name,
            "sequenceNumber": sequence_number,
            "timestamp": server_timestamp(),
        }))
    }
}

/// A chat line. Ordered by `timestamp`; never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message body.
    pub text: String,
    /// Author's participant id.
    pub author_id: String,
    /// Author's display name.
    pub author_name: String,
    /// Server time of the write.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Moves on the board when the message was sent.
    pub move_number: usize,
    /// Room status when the message was sent.
    pub game_status: RoomStatus,
}

impl ChatMessage {
    /// Document for a new message, stamped by the store.
    pub fn new_document(
        text: &str,
        author: &Participant,
        move_number: usize,
        game_status: RoomStatus,
    ) -> Document {
        fields(json!({
            "text": text,
            "authorId": author.id,
            "authorName": author.display_name,
            "timestamp": server_timestamp(),
            "moveNumber": move_number,
            "gameStatus": game_status,
        }))
    }

    /// Decodes a stored message.
    ///
    /// # Errors
    ///
    /// Returns a malformed-document error when fields are missing or invalid.
    pub fn from_stored(stored: StoredDocument) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(serde_json::Value::Object(stored.fields))?)
    }
}

/// Summary written when a match in a room ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// How it ended.
    pub outcome: Outcome,
    /// Board at the end.
    pub final_board: Board,
    /// Moves played.
    pub total_moves: usize,
    /// Host at the time.
    pub host_id: String,
    /// Guest at the time.
    pub guest_id: Option<String>,
    /// Server time of the write.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ended_at: DateTime<Utc>,
}

impl GameRecord {
    /// Document for a new record, stamped by the store.
    pub fn new_document(
        outcome: Outcome,
        final_board: &Board,
        host: &Participant,
        guest: Option<&Participant>,
    ) -> Document {
        fields(json!({
            "outcome": outcome,
            "finalBoard": final_board,
            "totalMoves": final_board.occupied_count(),
            "hostId": host.id,
            "guestId": guest.map(|g| g.id.clone()),
            "endedAt": server_timestamp(),
        }))
    }
}
