//! Online play for tres en raya over a shared document store.
//!
//! # Architecture
//!
//! - **Store**: [`store::DocumentStore`] is the only channel between
//!   participants. [`store::MemoryStore`] implements it in-process.
//! - **Room lifecycle**: [`RoomLifecycle`] creates, joins, expires and
//!   deletes [`Room`]s.
//! - **Session synchronizer**: [`OnlineSession`] validates moves against its
//!   cached room, writes them, and folds pushed room states back in,
//!   reporting [`SessionEvent`]s.
//! - **Records**: [`MoveRecord`], [`ChatMessage`] and [`GameRecord`] are
//!   appended beside each room.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod clock;
mod error;
mod lifecycle;
mod records;
mod room;
mod session;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SessionError, StoreError, StoreErrorKind};
pub use lifecycle::{
    DEFAULT_CREATE_ATTEMPTS, DEFAULT_ROOM_EXPIRY_SECS, LifecycleConfig, RoomLifecycle,
};
pub use records::{CHAT_HISTORY_LIMIT, ChatMessage, GameRecord, MoveRecord};
pub use room::{
    JOIN_LINK_PARAM, Participant, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, ROOMS, Role, Room, RoomCode,
    RoomStatus, history_collection, messages_collection, moves_collection,
};
pub use session::{OnlineSession, SessionEvent};
