//! Online session synchronizer.
//!
//! Two participants never talk to each other directly. Each runs an
//! [`OnlineSession`] that writes its moves to the shared room document and
//! folds every pushed version of that document back into a cached
//! [`Room`]. The cache is always replaced wholesale by what the store pushes,
//! so any divergence lasts at most one round trip.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use tresenraya_core::{Board, Outcome, Symbol};

use crate::store::{
    AppendSubscription, Document, DocumentStore, DocumentSubscription, StoredDocument, fields,
    server_timestamp,
};
use crate::{
    CHAT_HISTORY_LIMIT, ChatMessage, GameRecord, MoveRecord, Participant, ROOMS, Role, Room,
    RoomCode, RoomStatus, SessionError, history_collection, messages_collection, moves_collection,
};

/// Render-relevant change in an online session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Board differs from the previous view.
    BoardUpdated(Board),
    /// A different symbol is to move.
    TurnChanged(Symbol),
    /// Room status changed.
    RoomStatusChanged(RoomStatus),
    /// The other seat is occupied.
    OpponentJoined(Participant),
    /// The match ended.
    MatchFinished(Outcome),
    /// A chat line arrived. `own` is true for this participant's messages.
    ChatAppended {
        /// The message.
        message: ChatMessage,
        /// Whether this participant wrote it.
        own: bool,
    },
    /// The room document was deleted.
    RoomClosed,
    /// Something failed that the player should hear about.
    Error(SessionError),
}

/// What [`OnlineSession::pump`] received.
enum Incoming {
    Room(Option<Document>),
    Chat(StoredDocument),
    Closed,
}

/// One participant's view of a shared room.
#[derive(Debug)]
pub struct OnlineSession {
    store: Arc<dyn DocumentStore>,
    code: RoomCode,
    role: Role,
    me: Participant,
    room: Option<Room>,
    room_updates: Option<DocumentSubscription>,
    chat_updates: Option<AppendSubscription>,
    events: mpsc::UnboundedSender<SessionEvent>,
    opponent_seen: bool,
}

impl OnlineSession {
    /// Subscribes to room `code` and its chat, then folds in the current
    /// room state.
    ///
    /// # Errors
    ///
    /// - [`SessionError::RoomNotFound`] if the room does not exist.
    /// - [`SessionError::RoomNotJoinable`] if the seat for `role` belongs to
    ///   someone else.
    /// - [`SessionError::StoreUnavailable`] if subscribing fails.
    #[instrument(skip(store, events), fields(%code, %role, me = %me.id))]
    pub async fn attach(
        store: Arc<dyn DocumentStore>,
        code: RoomCode,
        role: Role,
        me: Participant,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Self, SessionError> {
        let room_updates = store
            .subscribe(ROOMS, code.as_str())
            .await
            .map_err(|e| SessionError::from_store(e, &code))?;

        let mut session = Self {
            store,
            code,
            role,
            me,
            room: None,
            room_updates: Some(room_updates),
            chat_updates: None,
            events,
            opponent_seen: false,
        };

        session.sync();
        let Some(room) = session.room.as_ref() else {
            warn!("Attached to a missing room");
            return Err(SessionError::RoomNotFound {
                code: session.code.clone(),
            });
        };
        // An empty guest seat is fine: the join may not have been pushed yet.
        if room
            .participant(role)
            .is_some_and(|seated| seated.id != session.me.id)
        {
            warn!("Seat belongs to another participant");
            return Err(SessionError::RoomNotJoinable {
                code: session.code.clone(),
                reason: "seat belongs to another participant",
            });
        }

        let chat_updates = session
            .store
            .append_subscribe(
                &messages_collection(&session.code),
                "timestamp",
                Some(CHAT_HISTORY_LIMIT),
            )
            .await
            .map_err(|e| SessionError::from_store(e, &session.code))?;
        session.chat_updates = Some(chat_updates);

        info!(symbol = %role.symbol(), "Attached to room");
        Ok(session)
    }

    /// Room code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seat held by this participant.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Symbol this participant plays.
    pub fn symbol(&self) -> Symbol {
        self.role.symbol()
    }

    /// This participant.
    pub fn participant(&self) -> &Participant {
        &self.me
    }

    /// Latest known room state.
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    /// True when the cached room says it is this participant's move.
    pub fn is_my_turn(&self) -> bool {
        self.room.as_ref().is_some_and(|room| {
            matches!(room.status(), RoomStatus::Ready | RoomStatus::Playing)
                && *room.turn() == self.symbol()
        })
    }

    /// Plays `symbol` at `index`.
    ///
    /// Pending pushes are folded in first, then validation runs against the
    /// cached room, so a rejected move never reaches the store. An accepted move is written as a single
    /// update (board, turn, status, winner, activity) and applied to the
    /// cache without waiting for the echo.
    ///
    /// Returns the outcome if this move ended the match.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MatchFinished`] / [`SessionError::RoomExpired`]
    ///   once the room is closed.
    /// - [`SessionError::WaitingForOpponent`] before a guest joins.
    /// - [`SessionError::NotYourTurn`] if `symbol` is not this seat's symbol,
    ///   not the symbol to move, or the seat is not held by this participant.
    /// - [`SessionError::IllegalMove`] for an off-board or occupied cell.
    /// - [`SessionError::StoreUnavailable`] if the write fails.
    #[instrument(skip(self), fields(code = %self.code, role = %self.role))]
    pub async fn submit_move(
        &mut self,
        index: usize,
        symbol: Symbol,
    ) -> Result<Option<Outcome>, SessionError> {
        self.sync();
        let room = self.seated_room()?;

        let turn = *room.turn();
        if symbol != self.role.symbol() || symbol != turn {
            warn!(index, %symbol, %turn, "Move out of turn");
            return Err(SessionError::NotYourTurn { symbol, turn });
        }

        let board = room.board().apply(index, symbol).inspect_err(|e| {
            warn!(index, error = %e, "Illegal move");
        })?;
        let outcome = board.terminal();
        let (next_turn, status, winner) = match outcome {
            Some(outcome) => (turn, RoomStatus::Finished, outcome.winner()),
            None => (turn.opponent(), RoomStatus::Playing, None),
        };

        let update = fields(json!({
            "board": board,
            "turn": next_turn,
            "status": status,
            "winner": winner,
            "lastActivity": server_timestamp(),
        }));
        self.store
            .update(ROOMS, self.code.as_str(), update)
            .await
            .map_err(|e| SessionError::from_store(e, &self.code))?;

        info!(index, %symbol, %status, "Move written");

        let mut optimistic = room.clone();
        optimistic.set_play(board, next_turn, status, winner, Utc::now());
        self.on_remote_update(Some(optimistic));

        self.record_move(index, symbol, board.occupied_count()).await;
        if let Some(outcome) = outcome {
            self.record_result(outcome, &board).await;
        }

        Ok(outcome)
    }

    /// Clears the board for a new match while the room is still open.
    ///
    /// # Errors
    ///
    /// Same room-state errors as [`OnlineSession::submit_move`], plus
    /// [`SessionError::StoreUnavailable`] if the write fails.
    #[instrument(skip(self), fields(code = %self.code))]
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        self.sync();
        let room = self.seated_room()?;

        let update = fields(json!({
            "board": Board::new(),
            "turn": Symbol::X,
            "status": RoomStatus::Playing,
            "winner": null,
            "lastActivity": server_timestamp(),
        }));
        self.store
            .update(ROOMS, self.code.as_str(), update)
            .await
            .map_err(|e| SessionError::from_store(e, &self.code))?;

        let mut optimistic = room.clone();
        optimistic.set_play(Board::new(), Symbol::X, RoomStatus::Playing, None, Utc::now());
        self.on_remote_update(Some(optimistic));
        info!("Match restarted");
        Ok(())
    }

    /// Folds a pushed room state into the cache.
    ///
    /// The cache is replaced verbatim; events describe what changed relative
    /// to the previous view. `None` means the room was deleted.
    #[instrument(skip(self, update), fields(code = %self.code))]
    pub fn on_remote_update(&mut self, update: Option<Room>) {
        let Some(next) = update else {
            if self.room.take().is_some() {
                info!("Room deleted remotely");
                self.emit(SessionEvent::RoomClosed);
            }
            return;
        };

        let previous = self.room.replace(next.clone());
        let prev = previous.as_ref();

        if prev.is_none_or(|p| p.board() != next.board()) {
            self.emit(SessionEvent::BoardUpdated(*next.board()));
        }
        if prev.is_none_or(|p| p.turn() != next.turn()) {
            self.emit(SessionEvent::TurnChanged(*next.turn()));
        }
        if prev.is_none_or(|p| p.status() != next.status()) {
            debug!(status = %next.status(), "Room status changed");
            self.emit(SessionEvent::RoomStatusChanged(*next.status()));
            if let Some(outcome) = next.outcome() {
                self.emit(SessionEvent::MatchFinished(outcome));
            }
        }

        let opponent_role = match self.role {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        };
        if !self.opponent_seen
            && let Some(opponent) = next.participant(opponent_role)
        {
            self.opponent_seen = true;
            info!(opponent = %opponent.id, "Opponent present");
            self.emit(SessionEvent::OpponentJoined(opponent.clone()));
        }
    }

    /// Processes every notification already delivered, without waiting.
    /// Returns how many were handled.
    pub fn sync(&mut self) -> usize {
        let mut handled = 0;
        while let Some(document) = self.room_updates.as_mut().and_then(|s| s.try_recv()) {
            self.fold_room_document(document);
            handled += 1;
        }
        while let Some(stored) = self.chat_updates.as_mut().and_then(|s| s.try_recv()) {
            self.fold_chat(stored);
            handled += 1;
        }
        handled
    }

    /// Waits for the next notification on either stream and processes it.
    ///
    /// Returns `false` once both subscriptions are gone.
    pub async fn pump(&mut self) -> bool {
        let incoming = match (self.room_updates.as_mut(), self.chat_updates.as_mut()) {
            (Some(room), Some(chat)) => tokio::select! {
                Some(document) = room.recv() => Incoming::Room(document),
                Some(stored) = chat.recv() => Incoming::Chat(stored),
                else => Incoming::Closed,
            },
            (Some(room), None) => room.recv().await.map_or(Incoming::Closed, Incoming::Room),
            (None, Some(chat)) => chat.recv().await.map_or(Incoming::Closed, Incoming::Chat),
            (None, None) => Incoming::Closed,
        };

        match incoming {
            Incoming::Room(document) => self.fold_room_document(document),
            Incoming::Chat(stored) => self.fold_chat(stored),
            Incoming::Closed => return false,
        }
        true
    }

    /// Posts a chat line to the room. Blank text is ignored.
    ///
    /// A failed send is logged and reported as an [`SessionEvent::Error`];
    /// the session carries on.
    ///
    /// # Errors
    ///
    /// [`SessionError::StoreUnavailable`] if the append fails.
    #[instrument(skip(self, text), fields(code = %self.code))]
    pub async fn send_chat(&mut self, text: &str) -> Result<(), SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let (move_number, status) = self
            .room
            .as_ref()
            .map_or((0, RoomStatus::Waiting), |r| {
                (r.board().occupied_count(), *r.status())
            });
        let document = ChatMessage::new_document(text, &self.me, move_number, status);

        match self
            .store
            .append(&messages_collection(&self.code), document)
            .await
        {
            Ok(id) => {
                debug!(%id, "Chat message sent");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to send chat message");
                let err = SessionError::from_store(e, &self.code);
                self.emit(SessionEvent::Error(err.clone()));
                Err(err)
            }
        }
    }

    /// Leaves the room.
    ///
    /// Cancels both subscriptions. A host leaving an unfinished match also
    /// deletes the room; if that fails it is logged and not retried.
    #[instrument(skip(self), fields(code = %self.code, role = %self.role))]
    pub async fn leave(mut self) {
        self.cancel_subscriptions();

        let unfinished = self
            .room
            .as_ref()
            .is_some_and(|room| *room.status() != RoomStatus::Finished);
        if self.role == Role::Host && unfinished {
            match self.store.delete(ROOMS, self.code.as_str()).await {
                Ok(()) => info!("Host left unfinished match, room deleted"),
                Err(e) => warn!(error = %e, "Room cleanup failed"),
            }
        } else {
            info!("Left room");
        }
    }

    fn playable_room(&self) -> Result<&Room, SessionError> {
        let room = self.room.as_ref().ok_or_else(|| SessionError::RoomNotFound {
            code: self.code.clone(),
        })?;
        match room.status() {
            RoomStatus::Finished => Err(SessionError::MatchFinished),
            RoomStatus::Expired => Err(SessionError::RoomExpired),
            RoomStatus::Waiting => Err(SessionError::WaitingForOpponent),
            RoomStatus::Ready | RoomStatus::Playing => Ok(room),
        }
    }

    /// [`Self::playable_room`] held by this participant.
    fn seated_room(&self) -> Result<&Room, SessionError> {
        let room = self.playable_room()?;
        let seated = room
            .participant(self.role)
            .is_some_and(|p| p.id == self.me.id);
        if !seated {
            warn!(me = %self.me.id, "Seat not held by this participant");
            return Err(SessionError::NotYourTurn {
                symbol: self.role.symbol(),
                turn: *room.turn(),
            });
        }
        Ok(room)
    }

    fn fold_room_document(&mut self, document: Option<Document>) {
        match document.map(Room::from_document).transpose() {
            Ok(room) => self.on_remote_update(room),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable room document");
                self.emit(SessionEvent::Error(SessionError::from_store(e, &self.code)));
            }
        }
    }

    fn fold_chat(&mut self, stored: StoredDocument) {
        match ChatMessage::from_stored(stored) {
            Ok(message) => {
                let own = message.author_id == self.me.id;
                self.emit(SessionEvent::ChatAppended { message, own });
            }
            Err(e) => warn!(error = %e, "Ignoring unreadable chat message"),
        }
    }

    async fn record_move(&self, index: usize, symbol: Symbol, sequence_number: usize) {
        let document = MoveRecord::new_document(index, symbol, &self.me, sequence_number);
        if let Err(e) = self
            .store
            .append(&moves_collection(&self.code), document)
            .await
        {
            warn!(error = %e, index, "Failed to record move");
        }
    }

    async fn record_result(&self, outcome: Outcome, board: &Board) {
        let Some(room) = self.room.as_ref() else {
            return;
        };
        let document = GameRecord::new_document(
            outcome,
            board,
            room.host(),
            room.guest().as_ref(),
        );
        if let Err(e) = self
            .store
            .append(&history_collection(&self.code), document)
            .await
        {
            warn!(error = %e, "Failed to record game result");
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn cancel_subscriptions(&mut self) {
        if let Some(sub) = self.room_updates.take() {
            self.store.cancel(sub.handle());
        }
        if let Some(sub) = self.chat_updates.take() {
            self.store.cancel(sub.handle());
        }
    }
}

impl Drop for OnlineSession {
    fn drop(&mut self) {
        self.cancel_subscriptions();
    }
}
