//! The shared room document and the identities around it.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use tresenraya_core::{Board, Outcome, Symbol};

use crate::store::{Document, server_timestamp};
use crate::{SessionError, StoreError};

/// Collection holding room documents.
pub const ROOMS: &str = "rooms";

/// Characters a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Query parameter carrying the code in a join link.
pub const JOIN_LINK_PARAM: &str = "room";

/// Six-character `[A-Z0-9]` room identifier.
///
/// Doubles as the document key and as the token shared in join links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Draws a random code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// The code as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shareable link: `base_url?room=CODE`.
    pub fn join_link(&self, base_url: &str) -> String {
        let base = base_url.split('?').next().unwrap_or(base_url);
        format!("{}?{}={}", base, JOIN_LINK_PARAM, self.0)
    }

    /// Extracts and validates the code from a join link.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidRoomCode`] if the link has no `room`
    /// parameter or the value is not a valid code.
    #[instrument]
    pub fn from_join_link(link: &str) -> Result<Self, SessionError> {
        let query = link.split_once('?').map(|(_, q)| q).unwrap_or_default();
        let value = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == JOIN_LINK_PARAM)
            .map(|(_, value)| value.split('#').next().unwrap_or(value))
            .ok_or_else(|| SessionError::InvalidRoomCode {
                input: link.to_string(),
            })?;
        value.parse()
    }
}

impl FromStr for RoomCode {
    type Err = SessionError;

    /// Accepts lower-case input and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let valid = code.len() == ROOM_CODE_LEN
            && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
        if valid {
            Ok(Self(code))
        } else {
            Err(SessionError::InvalidRoomCode {
                input: s.to_string(),
            })
        }
    }
}

impl TryFrom<String> for RoomCode {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

/// Opaque identity supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Stable participant id.
    #[new(into)]
    pub id: String,
    /// Name shown to the other player.
    #[new(into)]
    pub display_name: String,
}

/// Seat in a room. Fixed for the room's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Created the room; plays X.
    Host,
    /// Joined the room; plays O.
    Guest,
}

impl Role {
    /// Symbol this seat always plays.
    pub fn symbol(self) -> Symbol {
        match self {
            Role::Host => Symbol::X,
            Role::Guest => Symbol::O,
        }
    }
}

/// Room lifecycle status.
///
/// `Finished` and `Expired` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoomStatus {
    /// Host alone, code shared.
    Waiting,
    /// Guest seated, no move yet.
    Ready,
    /// At least one move played.
    Playing,
    /// Win or draw reached.
    Finished,
    /// Swept for inactivity.
    Expired,
}

impl RoomStatus {
    /// True for the final states.
    pub fn is_closed(self) -> bool {
        matches!(self, RoomStatus::Finished | RoomStatus::Expired)
    }

    /// The status as stored in documents.
    pub fn to_value(self) -> Value {
        Value::String(self.to_string())
    }
}

/// The shared room document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    room_id: RoomCode,
    board: Board,
    turn: Symbol,
    host: Participant,
    guest: Option<Participant>,
    status: RoomStatus,
    winner: Option<Symbol>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    last_activity: DateTime<Utc>,
}

impl Room {
    /// A freshly opened room: empty board, X to move, waiting for a guest.
    pub fn waiting(room_id: RoomCode, host: Participant, now: DateTime<Utc>) -> Self {
        Self {
            room_id,
            board: Board::new(),
            turn: Symbol::X,
            host,
            guest: None,
            status: RoomStatus::Waiting,
            winner: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Participant holding `role`.
    pub fn participant(&self, role: Role) -> Option<&Participant> {
        match role {
            Role::Host => Some(&self.host),
            Role::Guest => self.guest.as_ref(),
        }
    }

    /// How the match ended, once the room is finished.
    pub fn outcome(&self) -> Option<Outcome> {
        (self.status == RoomStatus::Finished)
            .then(|| self.winner.map_or(Outcome::Draw, Outcome::Winner))
    }

    /// True when `now - last_activity` exceeds `threshold`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::TimeDelta) -> bool {
        now - self.last_activity > threshold
    }

    /// Encodes the room, asking the store to stamp both timestamps.
    ///
    /// # Errors
    ///
    /// Returns a malformed-document error if encoding fails.
    pub fn to_new_document(&self) -> Result<Document, StoreError> {
        let mut document = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::malformed(format!(
                    "room encoded as non-object: {}",
                    other
                )));
            }
        };
        document.insert("createdAt".into(), server_timestamp());
        document.insert("lastActivity".into(), server_timestamp());
        Ok(document)
    }

    /// Decodes a stored room.
    ///
    /// # Errors
    ///
    /// Returns a malformed-document error when fields are missing or invalid.
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    pub(crate) fn set_guest(&mut self, guest: Participant, now: DateTime<Utc>) {
        self.guest = Some(guest);
        self.status = RoomStatus::Ready;
        self.last_activity = now;
    }

    pub(crate) fn set_play(
        &mut self,
        board: Board,
        turn: Symbol,
        status: RoomStatus,
        winner: Option<Symbol>,
        now: DateTime<Utc>,
    ) {
        self.board = board;
        self.turn = turn;
        self.status = status;
        self.winner = winner;
        self.last_activity = now;
    }
}

/// Collection of move records for a room.
pub fn moves_collection(code: &RoomCode) -> String {
    format!("{}/{}/moves", ROOMS, code)
}

/// Collection of chat messages for a room.
pub fn messages_collection(code: &RoomCode) -> String {
    format!("{}/{}/messages", ROOMS, code)
}

/// Collection of finished-game records for a room.
pub fn history_collection(code: &RoomCode) -> String {
    format!("{}/{}/history", ROOMS, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_codes_are_valid() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(code.as_str().parse::<RoomCode>().unwrap(), code);
        }
    }

    #[test]
    fn codes_are_normalised_and_validated() {
        assert_eq!("ab12cd".parse::<RoomCode>().unwrap().as_str(), "AB12CD");
        assert!("AB12C".parse::<RoomCode>().is_err());
        assert!("AB-2CD".parse::<RoomCode>().is_err());
    }

    #[test]
    fn join_link_round_trip() {
        let code: RoomCode = "AB12CD".parse().unwrap();
        let link = code.join_link("https://play.example/index.html?room=OLD123");
        assert_eq!(link, "https://play.example/index.html?room=AB12CD");
        assert_eq!(RoomCode::from_join_link(&link).unwrap(), code);
        assert!(RoomCode::from_join_link("https://play.example/").is_err());
        assert_eq!(
            RoomCode::from_join_link("https://x/?lang=es&room=zz99aa#top").unwrap().as_str(),
            "ZZ99AA"
        );
    }

    #[test]
    fn room_round_trips_through_a_document() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let room = Room::waiting(
            "AB12CD".parse().unwrap(),
            Participant::new("u1", "Ana"),
            now,
        );
        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["status"], "waiting");
        assert_eq!(value["turn"], "X");
        assert_eq!(value["lastActivity"], 1_700_000_000_000i64);

        let Value::Object(document) = value else {
            panic!("room must encode as an object");
        };
        assert_eq!(Room::from_document(document).unwrap(), room);
    }
}
