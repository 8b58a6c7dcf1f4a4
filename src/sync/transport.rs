//! Room Transport Abstraction
//!
//! The sync layer talks to the realtime backend through this minimal
//! interface: a keyed upsert per participant and a subscribe-by-room
//! change feed. No ordering or delivery guarantee is assumed beyond
//! "eventually delivered, possibly deduplicated", which keeps the layer
//! testable against the in-memory implementation below.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::room::state::{RoomPlayer, UserId};

/// One participant's latest-known shared state, as carried on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Room the snapshot belongs to.
    pub room_id: Uuid,
    /// Owning participant.
    pub user_id: UserId,
    /// Display name for ghosts and the leaderboard.
    pub display_name: String,
    /// Latest broadcast score.
    pub score: u32,
    /// Whether the participant's bird is alive.
    pub alive: bool,
    /// Last broadcast vertical position, for ghost rendering only.
    pub bird_y: Option<f32>,
    /// Lobby ready flag.
    pub ready: bool,
}

impl From<&RoomPlayer> for PlayerSnapshot {
    fn from(player: &RoomPlayer) -> Self {
        Self {
            room_id: player.room_id,
            user_id: player.user_id,
            display_name: player.display_name.clone(),
            score: player.score,
            alive: player.alive,
            bird_y: player.bird_y,
            ready: player.ready,
        }
    }
}

/// Transport failures. Always non-fatal to gameplay: the sync layer logs
/// and degrades to stale ghost data rather than crash the local game.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The backend refused or dropped the write.
    #[error("transport rejected upsert: {0}")]
    UpsertFailed(String),
}

/// Boundary contract with the realtime backend.
///
/// Dropping the returned receiver unsubscribes.
pub trait RoomTransport: Send + Sync {
    /// Last-write-wins upsert of one participant's snapshot, keyed by
    /// `(room_id, user_id)`. Best-effort; fire-and-forget from the
    /// simulation's perspective.
    fn upsert(&self, snapshot: PlayerSnapshot) -> Result<(), TransportError>;

    /// Subscribe to snapshot changes for one room.
    fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<PlayerSnapshot>;

    /// Latest-known snapshots for a room, for late subscribers.
    fn latest(&self, room_id: Uuid) -> Vec<PlayerSnapshot>;
}

/// In-memory transport used by tests and the demo binary.
pub struct InMemoryTransport {
    channels: Mutex<BTreeMap<Uuid, broadcast::Sender<PlayerSnapshot>>>,
    records: Mutex<BTreeMap<(Uuid, UserId), PlayerSnapshot>>,
}

impl InMemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(BTreeMap::new()),
            records: Mutex::new(BTreeMap::new()),
        }
    }

    fn channel(&self, room_id: Uuid) -> broadcast::Sender<PlayerSnapshot> {
        let mut channels = self.channels.lock().expect("transport lock poisoned");
        channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(256).0)
            .clone()
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomTransport for InMemoryTransport {
    fn upsert(&self, snapshot: PlayerSnapshot) -> Result<(), TransportError> {
        let key = (snapshot.room_id, snapshot.user_id);
        self.records
            .lock()
            .expect("transport lock poisoned")
            .insert(key, snapshot.clone());

        // No subscribers is fine; delivery is best-effort.
        let _ = self.channel(snapshot.room_id).send(snapshot);
        Ok(())
    }

    fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<PlayerSnapshot> {
        self.channel(room_id).subscribe()
    }

    fn latest(&self, room_id: Uuid) -> Vec<PlayerSnapshot> {
        self.records
            .lock()
            .expect("transport lock poisoned")
            .iter()
            .filter(|((rid, _), _)| *rid == room_id)
            .map(|(_, snapshot)| snapshot.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(room_id: Uuid, user_id: UserId, score: u32) -> PlayerSnapshot {
        PlayerSnapshot {
            room_id,
            user_id,
            display_name: "p".into(),
            score,
            alive: true,
            bird_y: None,
            ready: false,
        }
    }

    #[tokio::test]
    async fn test_upsert_reaches_subscriber() {
        let transport = InMemoryTransport::new();
        let room_id = Uuid::new_v4();
        let mut rx = transport.subscribe(room_id);

        let user = Uuid::new_v4();
        transport.upsert(snapshot(room_id, user, 3)).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.user_id, user);
        assert_eq!(received.score, 3);
    }

    #[tokio::test]
    async fn test_upsert_without_subscribers_is_ok() {
        let transport = InMemoryTransport::new();
        let room_id = Uuid::new_v4();
        assert!(transport.upsert(snapshot(room_id, Uuid::new_v4(), 1)).is_ok());
    }

    #[tokio::test]
    async fn test_latest_is_last_write_wins() {
        let transport = InMemoryTransport::new();
        let room_id = Uuid::new_v4();
        let user = Uuid::new_v4();

        transport.upsert(snapshot(room_id, user, 1)).unwrap();
        transport.upsert(snapshot(room_id, user, 7)).unwrap();

        let latest = transport.latest(room_id);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].score, 7);
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let transport = InMemoryTransport::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();
        let mut rx_b = transport.subscribe(room_b);

        transport.upsert(snapshot(room_a, Uuid::new_v4(), 1)).unwrap();
        assert!(rx_b.try_recv().is_err());
        assert!(transport.latest(room_b).is_empty());
    }
}
