//! Synchronization Coordinator
//!
//! Binds one local simulation engine to the shared room model: local
//! events flow outward (score coalesced, death immediate) and remote
//! snapshots flow inward as passive ghost overlays that never influence
//! local physics.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::room::service::{RoomError, RoomService};
use crate::room::state::{PlayerEvent, UserId};
use crate::sim::events::SimEvent;
use crate::sync::debounce::DebouncedSender;
use crate::sync::transport::{PlayerSnapshot, RoomTransport};

/// Quiet window for coalescing outbound score updates.
pub const SCORE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Delay between the last death and the room-level Finished transition,
/// allowing last-moment UI settling.
pub const FINISH_GRACE: Duration = Duration::from_millis(1000);

/// Read-only projection of a remote participant. Rendering-only: ghost
/// positions snap to the last-known value, no extrapolation.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostPlayer {
    /// The remote participant.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Latest-known score.
    pub score: u32,
    /// Latest-known alive flag.
    pub alive: bool,
    /// Latest-known vertical position.
    pub bird_y: Option<f32>,
}

/// One row of the shared leaderboard, local player included.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    /// Participant.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Score.
    pub score: u32,
    /// Alive flag.
    pub alive: bool,
}

/// Per-client sync layer instance.
///
/// Constructed with `attach` and torn down with `shutdown`; the owning
/// game loop drives it by calling `handle_events`, `pump_remote` and
/// `maybe_finish` once per frame. `handle_events` and `pump_remote`
/// never block the tick; `maybe_finish` takes a short read lock on the
/// room directory.
pub struct SyncCoordinator {
    room_id: Uuid,
    user_id: UserId,
    local_name: String,
    service: Arc<RoomService>,
    outbound: DebouncedSender<PlayerEvent>,
    forwarder: JoinHandle<()>,
    remote_rx: broadcast::Receiver<PlayerSnapshot>,
    ghosts: BTreeMap<UserId, GhostPlayer>,
    local_score: u32,
    local_alive: bool,
    finish_task: Option<JoinHandle<()>>,
}

impl SyncCoordinator {
    /// Attach to a room the user has already joined. Seeds the ghost
    /// projection from current participants and subscribes to changes.
    pub async fn attach(
        service: Arc<RoomService>,
        transport: Arc<dyn RoomTransport>,
        room_id: Uuid,
        user_id: UserId,
    ) -> Result<Self, RoomError> {
        let participants = service.participants(room_id).await;
        let me = participants
            .iter()
            .find(|p| p.user_id == user_id)
            .ok_or(RoomError::NotAMember)?;
        let local_name = me.display_name.clone();

        let remote_rx = transport.subscribe(room_id);

        // Known participants first, then any fresher transport records.
        let mut ghosts = BTreeMap::new();
        for player in participants.iter().filter(|p| p.user_id != user_id) {
            ghosts.insert(
                player.user_id,
                GhostPlayer {
                    user_id: player.user_id,
                    display_name: player.display_name.clone(),
                    score: player.score,
                    alive: player.alive,
                    bird_y: player.bird_y,
                },
            );
        }
        for snapshot in transport.latest(room_id) {
            if snapshot.user_id != user_id {
                ghosts.insert(snapshot.user_id, ghost_from(&snapshot));
            }
        }

        let (outbound, mut out_rx) = DebouncedSender::new(SCORE_DEBOUNCE);

        // Outbound path: merge into the caller's own row, then fan the
        // updated row out to peers. Failures are logged, never surfaced;
        // broadcasts are best-effort from the simulation's perspective.
        let forwarder = {
            let service = Arc::clone(&service);
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                while let Some(event) = out_rx.recv().await {
                    if let Err(error) = service.report_event(room_id, user_id, event).await {
                        warn!(%room_id, %user_id, %error, "dropping outbound update");
                        continue;
                    }
                    let row = service
                        .participants(room_id)
                        .await
                        .into_iter()
                        .find(|p| p.user_id == user_id);
                    if let Some(row) = row {
                        if let Err(error) = transport.upsert(PlayerSnapshot::from(&row)) {
                            warn!(%room_id, %user_id, %error, "broadcast failed");
                        }
                    }
                }
            })
        };

        Ok(Self {
            room_id,
            user_id,
            local_name,
            service,
            outbound,
            forwarder,
            remote_rx,
            ghosts,
            local_score: 0,
            local_alive: true,
            finish_task: None,
        })
    }

    /// Route this tick's simulation events outward.
    ///
    /// Score updates coalesce within the debounce window; death is
    /// broadcast immediately with the final position.
    pub fn handle_events(&mut self, events: &[SimEvent]) {
        for event in events {
            match event {
                SimEvent::Scored { score, .. } => {
                    self.local_score = *score;
                    self.outbound.send(PlayerEvent::Score { value: *score });
                }
                SimEvent::Died { bird_y } => {
                    self.local_alive = false;
                    self.outbound.send_now(PlayerEvent::Death { bird_y: *bird_y });
                }
                SimEvent::PhaseChanged { .. } | SimEvent::RunEnded { .. } => {}
            }
        }
    }

    /// Broadcast the lobby ready flag (bypasses the score debounce).
    pub fn set_ready(&self, ready: bool) {
        self.outbound.send_now(PlayerEvent::Ready { value: ready });
    }

    /// Drain queued remote snapshots into the ghost projection.
    ///
    /// Each snapshot is taken as the latest-known state for that player:
    /// last write wins, duplicates are idempotent, and no event ordering
    /// is ever reconstructed. The local player's own broadcasts are
    /// ignored so its simulation never feeds back on itself.
    pub fn pump_remote(&mut self) {
        loop {
            match self.remote_rx.try_recv() {
                Ok(snapshot) => {
                    if snapshot.user_id == self.user_id {
                        continue;
                    }
                    self.ghosts.insert(snapshot.user_id, ghost_from(&snapshot));
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    // Dropped updates are fine; newer snapshots supersede.
                    debug!(skipped, "remote feed lagged");
                }
                Err(_) => break,
            }
        }
    }

    /// Trigger the room-level Finished transition once every participant
    /// (remotes plus the local player) is dead while the room is still
    /// Playing. Runs after a short grace delay, exactly once.
    ///
    /// Reconciles the ghost map against current membership first, so a
    /// player who left mid-game cannot hold the room open with a stale
    /// `alive` ghost.
    pub async fn maybe_finish(&mut self) {
        if self.finish_task.is_some() || self.local_alive {
            return;
        }

        let members: BTreeSet<UserId> = self
            .service
            .participants(self.room_id)
            .await
            .iter()
            .map(|p| p.user_id)
            .collect();
        self.ghosts.retain(|user_id, _| members.contains(user_id));

        // An empty ghost map counts as zero alive remotes: if everyone
        // else has left and the local bird is dead, the room finishes.
        if self.ghosts.values().any(|g| g.alive) {
            return;
        }

        let service = Arc::clone(&self.service);
        let room_id = self.room_id;
        self.finish_task = Some(tokio::spawn(async move {
            tokio::time::sleep(FINISH_GRACE).await;
            match service.finish_room(room_id).await {
                Ok(true) => info!(%room_id, "room auto-finished"),
                Ok(false) => debug!(%room_id, "room already finished"),
                Err(error) => warn!(%room_id, %error, "auto-finish failed"),
            }
        }));
    }

    /// Ghost overlay for one remote participant.
    pub fn ghost(&self, user_id: &UserId) -> Option<&GhostPlayer> {
        self.ghosts.get(user_id)
    }

    /// All remote ghosts, in stable user order.
    pub fn ghosts(&self) -> impl Iterator<Item = &GhostPlayer> {
        self.ghosts.values()
    }

    /// Shared leaderboard: local player plus all ghosts, best score first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .ghosts
            .values()
            .map(|g| LeaderboardEntry {
                user_id: g.user_id,
                display_name: g.display_name.clone(),
                score: g.score,
                alive: g.alive,
            })
            .collect();
        entries.push(LeaderboardEntry {
            user_id: self.user_id,
            display_name: self.local_name.clone(),
            score: self.local_score,
            alive: self.local_alive,
        });
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.display_name.cmp(&b.display_name)));
        entries
    }

    /// Tear down: cancel the debounce worker, the outbound forwarder and
    /// any pending auto-finish. An in-flight broadcast may complete or be
    /// dropped; nothing panics after teardown.
    pub fn shutdown(self) {
        self.outbound.shutdown();
        self.forwarder.abort();
        if let Some(task) = self.finish_task {
            task.abort();
        }
    }
}

fn ghost_from(snapshot: &PlayerSnapshot) -> GhostPlayer {
    GhostPlayer {
        user_id: snapshot.user_id,
        display_name: snapshot.display_name.clone(),
        score: snapshot.score,
        alive: snapshot.alive,
        bird_y: snapshot.bird_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::state::RoomPhase;
    use crate::sync::transport::InMemoryTransport;

    struct Fixture {
        service: Arc<RoomService>,
        transport: Arc<InMemoryTransport>,
        room_id: Uuid,
        host: UserId,
        guest: UserId,
    }

    async fn fixture() -> Fixture {
        let service = Arc::new(RoomService::new());
        let transport = Arc::new(InMemoryTransport::new());
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();

        let room = service.create_room(host, "host", "owl").await.unwrap();
        service.join_room(&room.code, guest, "guest", "cat").await.unwrap();

        Fixture {
            service,
            transport,
            room_id: room.id,
            host,
            guest,
        }
    }

    async fn fixture_playing() -> Fixture {
        let f = fixture().await;
        f.service.set_ready(f.room_id, f.host, true).await.unwrap();
        f.service.set_ready(f.room_id, f.guest, true).await.unwrap();
        f.service.start_game(f.room_id, f.host).await.unwrap();
        f.service.begin_playing(f.room_id).await.unwrap();
        f
    }

    async fn attach(f: &Fixture, user: UserId) -> SyncCoordinator {
        SyncCoordinator::attach(
            Arc::clone(&f.service),
            Arc::clone(&f.transport) as Arc<dyn RoomTransport>,
            f.room_id,
            user,
        )
        .await
        .unwrap()
    }

    fn remote_snapshot(f: &Fixture, user: UserId, score: u32, alive: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            room_id: f.room_id,
            user_id: user,
            display_name: "guest".into(),
            score,
            alive,
            bird_y: Some(320.0),
            ready: true,
        }
    }

    #[tokio::test]
    async fn test_attach_requires_membership() {
        let f = fixture().await;
        let stranger = Uuid::new_v4();
        let result = SyncCoordinator::attach(
            Arc::clone(&f.service),
            Arc::clone(&f.transport) as Arc<dyn RoomTransport>,
            f.room_id,
            stranger,
        )
        .await;
        assert!(matches!(result, Err(RoomError::NotAMember)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_scores_coalesce_to_one_broadcast() {
        let f = fixture().await;
        let mut coordinator = attach(&f, f.host).await;
        let mut observer = f.transport.subscribe(f.room_id);

        // Five rapid increments inside one debounce window.
        for score in 1..=5u32 {
            coordinator.handle_events(&[SimEvent::Scored {
                obstacle_id: score as u64,
                score,
            }]);
        }
        tokio::time::sleep(Duration::from_millis(320)).await;

        let first = observer.recv().await.unwrap();
        assert_eq!(first.user_id, f.host);
        assert_eq!(first.score, 5, "only the final value is broadcast");
        assert!(observer.try_recv().is_err(), "exactly one outbound update");

        // The shared row carries the same merged value.
        let row = f
            .service
            .participants(f.room_id)
            .await
            .into_iter()
            .find(|p| p.user_id == f.host)
            .unwrap();
        assert_eq!(row.score, 5);

        coordinator.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_death_broadcast_bypasses_debounce() {
        let f = fixture().await;
        let mut coordinator = attach(&f, f.host).await;
        let mut observer = f.transport.subscribe(f.room_id);

        coordinator.handle_events(&[SimEvent::Died { bird_y: 611.0 }]);
        // No debounce window needs to elapse.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let update = observer.recv().await.unwrap();
        assert!(!update.alive);
        assert_eq!(update.bird_y, Some(611.0));

        coordinator.shutdown();
    }

    #[tokio::test]
    async fn test_ghosts_are_last_write_wins_and_idempotent() {
        let f = fixture().await;
        let mut coordinator = attach(&f, f.host).await;

        f.transport.upsert(remote_snapshot(&f, f.guest, 3, true)).unwrap();
        f.transport.upsert(remote_snapshot(&f, f.guest, 3, true)).unwrap();
        coordinator.pump_remote();
        assert_eq!(coordinator.ghost(&f.guest).unwrap().score, 3);

        // A stale value delivered later still wins: each snapshot is the
        // latest-known state, no ordering is reconstructed.
        f.transport.upsert(remote_snapshot(&f, f.guest, 1, true)).unwrap();
        coordinator.pump_remote();
        assert_eq!(coordinator.ghost(&f.guest).unwrap().score, 1);

        coordinator.shutdown();
    }

    #[tokio::test]
    async fn test_own_broadcasts_never_feed_back() {
        let f = fixture().await;
        let mut coordinator = attach(&f, f.host).await;

        f.transport.upsert(remote_snapshot(&f, f.host, 999, false)).unwrap();
        coordinator.pump_remote();

        assert!(coordinator.ghost(&f.host).is_none());
        let own = coordinator
            .leaderboard()
            .into_iter()
            .find(|e| e.user_id == f.host)
            .unwrap();
        assert_eq!(own.score, 0, "local state is driven by the engine only");
        assert!(own.alive);

        coordinator.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_finish_fires_exactly_once() {
        let f = fixture_playing().await;
        let mut coordinator = attach(&f, f.host).await;

        // Guest dies remotely, local bird dies too.
        f.transport.upsert(remote_snapshot(&f, f.guest, 2, false)).unwrap();
        coordinator.pump_remote();
        coordinator.handle_events(&[SimEvent::Died { bird_y: 600.0 }]);

        coordinator.maybe_finish().await;
        // Repeated zero-alive notifications must not schedule again.
        coordinator.pump_remote();
        coordinator.maybe_finish().await;

        tokio::time::sleep(FINISH_GRACE + Duration::from_millis(50)).await;

        let room = f.service.get_room(f.room_id).await.unwrap();
        assert_eq!(room.phase, RoomPhase::Finished);

        // The transition was consumed by the grace task; any further
        // finish attempt reports "already finished".
        assert!(!f.service.finish_room(f.room_id).await.unwrap());

        coordinator.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_finish_while_any_player_alive() {
        let f = fixture_playing().await;
        let mut coordinator = attach(&f, f.host).await;

        // Local player dies but the guest is still flying.
        coordinator.handle_events(&[SimEvent::Died { bird_y: 600.0 }]);
        coordinator.maybe_finish().await;

        tokio::time::sleep(FINISH_GRACE + Duration::from_millis(50)).await;
        let room = f.service.get_room(f.room_id).await.unwrap();
        assert_eq!(room.phase, RoomPhase::Playing);

        coordinator.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaver_does_not_block_auto_finish() {
        let f = fixture_playing().await;
        let mut coordinator = attach(&f, f.host).await;

        // The guest's last-known ghost says alive, then they leave the
        // room entirely. Only the local player remains, and dies.
        f.transport.upsert(remote_snapshot(&f, f.guest, 2, true)).unwrap();
        coordinator.pump_remote();
        f.service.leave_room(f.room_id, f.guest).await.unwrap();

        coordinator.handle_events(&[SimEvent::Died { bird_y: 600.0 }]);
        coordinator.maybe_finish().await;

        tokio::time::sleep(FINISH_GRACE + Duration::from_millis(50)).await;
        let room = f.service.get_room(f.room_id).await.unwrap();
        assert_eq!(room.phase, RoomPhase::Finished);
        assert!(coordinator.ghost(&f.guest).is_none(), "departed ghost evicted");

        coordinator.shutdown();
    }

    #[tokio::test]
    async fn test_leaderboard_orders_by_score() {
        let f = fixture().await;
        let mut coordinator = attach(&f, f.host).await;

        f.transport.upsert(remote_snapshot(&f, f.guest, 7, true)).unwrap();
        coordinator.pump_remote();
        coordinator.handle_events(&[SimEvent::Scored {
            obstacle_id: 0,
            score: 2,
        }]);

        let board = coordinator.leaderboard();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].user_id, f.guest);
        assert_eq!(board[0].score, 7);
        assert_eq!(board[1].score, 2);

        coordinator.shutdown();
    }
}
