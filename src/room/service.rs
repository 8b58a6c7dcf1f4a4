//! Room Service
//!
//! Owns the lifecycle of all rooms and participant rows. Explicitly
//! constructible (no global singleton) so tests never share hidden state;
//! all operations return typed results, never panic.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::rng::{derive_room_seed, SeededRng};
use crate::room::code::{generate_code, normalize_code};
use crate::room::state::{PlayerEvent, Room, RoomPhase, RoomPlayer, UserId};

/// Maximum participants per room.
pub const ROOM_CAP: usize = 5;

/// Bounded attempts at generating an unused room code.
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// Countdown between `Starting` and `Playing`.
pub const COUNTDOWN: Duration = Duration::from_secs(3);

/// Minimum ready participants before the host may start.
pub const MIN_READY_TO_START: usize = 2;

/// Room operation failures. Surfaced to the user as actionable messages,
/// never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No open room with that code.
    #[error("room not found")]
    NotFound,

    /// Participant cap reached.
    #[error("room is full")]
    RoomFull,

    /// The room already left the Waiting phase.
    #[error("game already started")]
    AlreadyStarted,

    /// Only the host may start the game.
    #[error("only the host can start the game")]
    NotHost,

    /// Fewer than the minimum ready participants.
    #[error("not enough players are ready")]
    NotEnoughReady,

    /// The caller is not a participant of this room.
    #[error("not a member of this room")]
    NotAMember,

    /// Room record could not be persisted (code generation exhausted).
    #[error("failed to create room")]
    CreationFailed,
}

/// In-memory room directory.
///
/// Rooms and participant rows live in `BTreeMap`s behind `RwLock`s; the
/// `(room_id, user_id)` map key enforces the unique-membership invariant.
pub struct RoomService {
    rooms: RwLock<BTreeMap<Uuid, Room>>,
    players: RwLock<BTreeMap<(Uuid, UserId), RoomPlayer>>,
}

impl RoomService {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(BTreeMap::new()),
            players: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a room hosted by `host_id`, generating a unique code and a
    /// fixed obstacle seed. All-or-nothing: on failure no player row is
    /// created either.
    pub async fn create_room(
        &self,
        host_id: UserId,
        display_name: impl Into<String>,
        avatar_tag: impl Into<String>,
    ) -> Result<Room, RoomError> {
        let id = Uuid::new_v4();
        let random_seed = derive_room_seed(&id);

        let mut rooms = self.rooms.write().await;
        let mut players = self.players.write().await;

        // Codes are drawn from a generator seeded off a throwaway UUID so
        // creation itself is not tied to the room seed.
        let mut code_rng = SeededRng::new(derive_room_seed(&Uuid::new_v4()));
        let mut code = None;
        for attempt in 0..MAX_CODE_ATTEMPTS {
            let candidate = generate_code(&mut code_rng);
            let taken = rooms.values().any(|r| r.is_open() && r.code == candidate);
            if !taken {
                code = Some(candidate);
                break;
            }
            warn!(attempt, "room code collision, regenerating");
        }
        let code = code.ok_or(RoomError::CreationFailed)?;

        let room = Room {
            id,
            code: code.clone(),
            phase: RoomPhase::Waiting,
            host_id,
            random_seed,
            created_at: chrono::Utc::now(),
        };

        rooms.insert(id, room.clone());
        players.insert(
            (id, host_id),
            RoomPlayer::new(id, host_id, display_name.into(), avatar_tag.into()),
        );

        info!(room_id = %id, code = %code, seed = random_seed, "room created");
        Ok(room)
    }

    /// Join a room by code. Idempotent for existing members.
    pub async fn join_room(
        &self,
        code: &str,
        user_id: UserId,
        display_name: impl Into<String>,
        avatar_tag: impl Into<String>,
    ) -> Result<Room, RoomError> {
        let code = normalize_code(code);

        let rooms = self.rooms.read().await;
        let room = rooms
            .values()
            .find(|r| r.is_open() && r.code == code)
            .cloned()
            .ok_or(RoomError::NotFound)?;
        drop(rooms);

        let mut players = self.players.write().await;

        // Rejoin returns the existing membership rather than erroring.
        if players.contains_key(&(room.id, user_id)) {
            debug!(room_id = %room.id, user_id = %user_id, "idempotent rejoin");
            return Ok(room);
        }

        let count = players.keys().filter(|(rid, _)| *rid == room.id).count();
        if count >= ROOM_CAP {
            return Err(RoomError::RoomFull);
        }

        players.insert(
            (room.id, user_id),
            RoomPlayer::new(room.id, user_id, display_name.into(), avatar_tag.into()),
        );

        info!(room_id = %room.id, user_id = %user_id, "player joined");
        Ok(room)
    }

    /// Toggle the caller's own ready flag. No cross-player side effects.
    pub async fn set_ready(
        &self,
        room_id: Uuid,
        user_id: UserId,
        ready: bool,
    ) -> Result<(), RoomError> {
        let mut players = self.players.write().await;
        let player = players
            .get_mut(&(room_id, user_id))
            .ok_or(RoomError::NotAMember)?;
        player.ready = ready;
        Ok(())
    }

    /// Host-only: move the room from Waiting to Starting. Returns the
    /// countdown the caller should wait before `begin_playing`.
    pub async fn start_game(&self, room_id: Uuid, user_id: UserId) -> Result<Duration, RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(RoomError::NotFound)?;

        if room.host_id != user_id {
            return Err(RoomError::NotHost);
        }
        if room.phase != RoomPhase::Waiting {
            return Err(RoomError::AlreadyStarted);
        }

        let players = self.players.read().await;
        let ready = players
            .values()
            .filter(|p| p.room_id == room_id && p.ready)
            .count();
        if ready < MIN_READY_TO_START {
            return Err(RoomError::NotEnoughReady);
        }

        room.phase = RoomPhase::Starting;
        info!(room_id = %room_id, ready, "countdown started");
        Ok(COUNTDOWN)
    }

    /// Finish the countdown: Starting -> Playing. Idempotent once Playing.
    pub async fn begin_playing(&self, room_id: Uuid) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(RoomError::NotFound)?;
        if room.phase == RoomPhase::Starting {
            room.phase = RoomPhase::Playing;
            info!(room_id = %room_id, "room playing");
        }
        Ok(())
    }

    /// Remove the caller's row; deletes the room once it has no players.
    pub async fn leave_room(&self, room_id: Uuid, user_id: UserId) -> Result<(), RoomError> {
        let mut players = self.players.write().await;
        players
            .remove(&(room_id, user_id))
            .ok_or(RoomError::NotAMember)?;

        let empty = !players.keys().any(|(rid, _)| *rid == room_id);
        drop(players);

        if empty {
            let mut rooms = self.rooms.write().await;
            rooms.remove(&room_id);
            info!(room_id = %room_id, "empty room deleted");
        }
        Ok(())
    }

    /// Merge a participant-owned update into the caller's own row. One
    /// participant can never mutate another's record.
    pub async fn report_event(
        &self,
        room_id: Uuid,
        user_id: UserId,
        event: PlayerEvent,
    ) -> Result<(), RoomError> {
        let mut players = self.players.write().await;
        let player = players
            .get_mut(&(room_id, user_id))
            .ok_or(RoomError::NotAMember)?;

        match event {
            PlayerEvent::Score { value } => player.score = value,
            PlayerEvent::Death { bird_y } => {
                player.alive = false;
                player.bird_y = Some(bird_y);
            }
            PlayerEvent::Ready { value } => player.ready = value,
        }
        Ok(())
    }

    /// Transition Playing -> Finished. Returns true only for the call that
    /// actually performed the transition, so auto-finish stays
    /// exactly-once under repeated notifications.
    pub async fn finish_room(&self, room_id: Uuid) -> Result<bool, RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(RoomError::NotFound)?;
        if room.phase == RoomPhase::Playing {
            room.phase = RoomPhase::Finished;
            info!(room_id = %room_id, "room finished");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Look up a room by id.
    pub async fn get_room(&self, room_id: Uuid) -> Option<Room> {
        self.rooms.read().await.get(&room_id).cloned()
    }

    /// All participant rows for a room, in stable user order.
    pub async fn participants(&self, room_id: Uuid) -> Vec<RoomPlayer> {
        self.players
            .read()
            .await
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect()
    }

    /// Number of open rooms.
    pub async fn open_room_count(&self) -> usize {
        self.rooms.read().await.values().filter(|r| r.is_open()).count()
    }
}

impl Default for RoomService {
    fn default() -> Self {
        Self::new()
    }
}
