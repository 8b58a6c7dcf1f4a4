//! Room and Participant State
//!
//! The shared multiplayer match model. A `Room` is created by a host and
//! identified by a short code; each participant owns exactly one
//! `RoomPlayer` row that only they may mutate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Participant identity.
pub type UserId = Uuid;

/// Lifecycle of a multiplayer match, independent of any single simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Room open; players may join, leave and toggle ready.
    #[default]
    Waiting,
    /// Host triggered start; countdown running.
    Starting,
    /// Match underway.
    Playing,
    /// All players dead, or explicitly ended.
    Finished,
}

/// The shared multiplayer match record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier.
    pub id: Uuid,
    /// Human-readable join code, unique among open rooms.
    pub code: String,
    /// Current phase.
    pub phase: RoomPhase,
    /// The creating player; only the host may start the game.
    pub host_id: UserId,
    /// Obstacle seed, fixed at creation and shared with every joiner so
    /// obstacle sequences are reproducible without transmitting them.
    pub random_seed: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Whether the room accepts new joins.
    pub fn is_open(&self) -> bool {
        self.phase == RoomPhase::Waiting
    }
}

/// One participant's shared, self-owned state within a room.
///
/// Mutated only by its owning client (plus membership removal). The local
/// player never reads its own broadcast fields back to drive its own
/// simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomPlayer {
    /// Room this row belongs to.
    pub room_id: Uuid,
    /// Owning participant.
    pub user_id: UserId,
    /// Display name shown to other participants.
    pub display_name: String,
    /// Avatar selection tag (opaque to the core).
    pub avatar_tag: String,
    /// Last broadcast score.
    pub score: u32,
    /// Whether the participant's bird is still alive.
    pub alive: bool,
    /// Last broadcast vertical position; used only for remote ghost
    /// rendering, never for collision.
    pub bird_y: Option<f32>,
    /// Ready flag for the lobby.
    pub ready: bool,
}

impl RoomPlayer {
    /// Fresh row for a participant who just joined.
    pub fn new(room_id: Uuid, user_id: UserId, display_name: String, avatar_tag: String) -> Self {
        Self {
            room_id,
            user_id,
            display_name,
            avatar_tag,
            score: 0,
            alive: true,
            bird_y: None,
            ready: false,
        }
    }
}

/// A participant-owned update, merged into that participant's own row only.
///
/// A closed union rather than a bag of optional fields, so reconciliation
/// is exhaustively checkable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// New score value (latest-wins; intermediate values may be coalesced).
    Score {
        /// The new total.
        value: u32,
    },
    /// The participant's bird died.
    Death {
        /// Final vertical position for the ghost.
        bird_y: f32,
    },
    /// Lobby ready toggle.
    Ready {
        /// The new ready flag.
        value: bool,
    },
}
