//! Room lifecycle: create, join, look up, expire and delete shared rooms.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::store::{DocumentStore, FilterOp, Query, fields, server_timestamp};
use crate::{Clock, Participant, ROOMS, Room, RoomCode, RoomStatus, SessionError};

/// Default inactivity window before a room is swept, in seconds.
pub const DEFAULT_ROOM_EXPIRY_SECS: i64 = 3600;

/// Default number of fresh codes tried before giving up on creation.
pub const DEFAULT_CREATE_ATTEMPTS: u32 = 5;

/// Tunables for [`RoomLifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct LifecycleConfig {
    /// Inactivity window after which a room is considered stale.
    expiry: TimeDelta,
    /// Codes tried before `create_room` reports failure.
    create_attempts: u32,
}

impl LifecycleConfig {
    /// Creates a configuration. At least one creation attempt is always made.
    pub fn new(expiry: TimeDelta, create_attempts: u32) -> Self {
        Self {
            expiry,
            create_attempts: create_attempts.max(1),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self::new(
            TimeDelta::seconds(DEFAULT_ROOM_EXPIRY_SECS),
            DEFAULT_CREATE_ATTEMPTS,
        )
    }
}

/// Creates, joins and garbage-collects rooms in a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct RoomLifecycle {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
}

impl RoomLifecycle {
    /// Creates a lifecycle manager over `store`.
    #[instrument(skip(store, clock))]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, config: LifecycleConfig) -> Self {
        info!("Creating RoomLifecycle");
        Self {
            store,
            clock,
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Opens a room under a fresh random code.
    ///
    /// Each candidate code is checked for existence before the room is
    /// written. The check and the write are separate calls, so two hosts
    /// racing on the same code can overwrite each other; with 36^6 codes this
    /// is accepted.
    ///
    /// # Errors
    ///
    /// [`SessionError::StoreUnavailable`] on backend failure or when every
    /// attempt collided.
    #[instrument(skip(self), fields(host = %host.id))]
    pub async fn create_room(&self, host: &Participant) -> Result<RoomCode, SessionError> {
        for attempt in 1..=self.config.create_attempts {
            let code = RoomCode::generate(&mut rand::thread_rng());
            let existing = self
                .store
                .get(ROOMS, code.as_str())
                .await
                .map_err(|e| SessionError::from_store(e, &code))?;

            if existing.is_some() {
                warn!(%code, attempt, "Room code collision, retrying");
                continue;
            }

            self.create_room_with_code(code.clone(), host).await?;
            return Ok(code);
        }

        warn!(attempts = self.config.create_attempts, "No free room code found");
        Err(SessionError::StoreUnavailable {
            message: "could not allocate a free room code".to_string(),
        })
    }

    /// Opens a room under `code`, replacing whatever was stored there.
    ///
    /// # Errors
    ///
    /// [`SessionError::StoreUnavailable`] on backend failure.
    #[instrument(skip(self), fields(host = %host.id))]
    pub async fn create_room_with_code(
        &self,
        code: RoomCode,
        host: &Participant,
    ) -> Result<Room, SessionError> {
        let room = Room::waiting(code.clone(), host.clone(), self.clock.now());
        let document = room
            .to_new_document()
            .map_err(|e| SessionError::from_store(e, &code))?;

        self.store
            .create(ROOMS, code.as_str(), document)
            .await
            .map_err(|e| SessionError::from_store(e, &code))?;

        info!(%code, "Room created, waiting for guest");
        Ok(room)
    }

    /// Seats `guest` in the room and moves it to `ready`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::RoomNotFound`] if there is no such room.
    /// - [`SessionError::RoomFull`] if a guest is already seated.
    /// - [`SessionError::RoomNotJoinable`] if the room is not waiting, has
    ///   gone stale, or `guest` is its host.
    /// - [`SessionError::StoreUnavailable`] on backend failure.
    #[instrument(skip(self), fields(guest = %guest.id))]
    pub async fn join_room(&self, code: &RoomCode, guest: &Participant) -> Result<Room, SessionError> {
        let mut room = self.fetch(code).await?.ok_or_else(|| {
            warn!(%code, "Join attempted on missing room");
            SessionError::RoomNotFound { code: code.clone() }
        })?;

        let now = self.clock.now();
        let refusal = if room.status().is_closed() {
            Some(SessionError::RoomNotJoinable {
                code: code.clone(),
                reason: "room is no longer active",
            })
        } else if room.guest().is_some() {
            Some(SessionError::RoomFull { code: code.clone() })
        } else if *room.status() != RoomStatus::Waiting {
            Some(SessionError::RoomNotJoinable {
                code: code.clone(),
                reason: "room is not waiting for a guest",
            })
        } else if room.host().id == guest.id {
            Some(SessionError::RoomNotJoinable {
                code: code.clone(),
                reason: "already seated as host",
            })
        } else if room.is_stale(now, self.config.expiry) {
            Some(SessionError::RoomNotJoinable {
                code: code.clone(),
                reason: "room has been idle too long",
            })
        } else {
            None
        };
        if let Some(err) = refusal {
            warn!(%code, status = %room.status(), error = %err, "Join refused");
            return Err(err);
        }

        let update = fields(json!({
            "guest": guest,
            "status": RoomStatus::Ready,
            "lastActivity": server_timestamp(),
        }));
        self.store
            .update(ROOMS, code.as_str(), update)
            .await
            .map_err(|e| SessionError::from_store(e, code))?;

        room.set_guest(guest.clone(), now);
        info!(%code, "Guest joined, room ready");
        Ok(room)
    }

    /// Returns the room behind a join link if it can still be played.
    ///
    /// Missing, finished and expired rooms all yield `None`.
    ///
    /// # Errors
    ///
    /// [`SessionError::StoreUnavailable`] on backend failure.
    #[instrument(skip(self))]
    pub async fn lookup(&self, code: &RoomCode) -> Result<Option<Room>, SessionError> {
        let room = self.fetch(code).await?;
        Ok(room.filter(|r| !r.status().is_closed()))
    }

    /// Marks every waiting or playing room idle since before
    /// `now - threshold` as expired. Returns how many rooms were swept.
    ///
    /// A room that fails to update is logged and skipped; the sweep
    /// continues with the rest.
    ///
    /// # Errors
    ///
    /// [`SessionError::StoreUnavailable`] or [`SessionError::CorruptDocument`]
    /// if the scan itself fails.
    #[instrument(skip(self))]
    pub async fn expire_stale_rooms(
        &self,
        now: DateTime<Utc>,
        threshold: TimeDelta,
    ) -> Result<usize, SessionError> {
        let cutoff = (now - threshold).timestamp_millis();
        let query = Query::new()
            .filter(
                "status",
                FilterOp::In,
                json!([RoomStatus::Waiting, RoomStatus::Playing]),
            )
            .filter("lastActivity", FilterOp::Lt, cutoff);

        let stale = self
            .store
            .query(ROOMS, query)
            .await
            .map_err(SessionError::from_store_scan)?;

        if stale.is_empty() {
            debug!("No stale rooms to sweep");
            return Ok(0);
        }

        let mut expired = 0;
        for room in stale {
            let update = fields(json!({
                "status": RoomStatus::Expired,
                "lastActivity": server_timestamp(),
            }));
            match self.store.update(ROOMS, &room.id, update).await {
                Ok(()) => expired += 1,
                Err(e) => warn!(room = %room.id, error = %e, "Failed to expire room"),
            }
        }

        info!(expired, "Swept stale rooms");
        Ok(expired)
    }

    /// Sweeps with the configured threshold and the lifecycle's clock.
    ///
    /// # Errors
    ///
    /// See [`RoomLifecycle::expire_stale_rooms`].
    pub async fn sweep(&self) -> Result<usize, SessionError> {
        self.expire_stale_rooms(self.clock.now(), self.config.expiry)
            .await
    }

    /// Deletes a room outright.
    ///
    /// # Errors
    ///
    /// [`SessionError::StoreUnavailable`] on backend failure.
    #[instrument(skip(self))]
    pub async fn delete_room(&self, code: &RoomCode) -> Result<(), SessionError> {
        self.store
            .delete(ROOMS, code.as_str())
            .await
            .map_err(|e| SessionError::from_store(e, code))?;
        info!(%code, "Room deleted");
        Ok(())
    }

    async fn fetch(&self, code: &RoomCode) -> Result<Option<Room>, SessionError> {
        let document = self
            .store
            .get(ROOMS, code.as_str())
            .await
            .map_err(|e| SessionError::from_store(e, code))?;

        document
            .map(Room::from_document)
            .transpose()
            .map_err(|e| SessionError::from_store(e, code))
    }
}
