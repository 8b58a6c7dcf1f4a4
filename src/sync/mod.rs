//! Multiplayer Sync Layer
//!
//! Event-driven bridge between the local simulation and the shared room:
//! outbound updates are debounced per participant, inbound snapshots
//! become read-only ghost overlays. The transport is a trait so tests and
//! the demo run against an in-memory backend.

pub mod coordinator;
pub mod debounce;
pub mod transport;

pub use coordinator::{
    GhostPlayer, LeaderboardEntry, SyncCoordinator, FINISH_GRACE, SCORE_DEBOUNCE,
};
pub use debounce::DebouncedSender;
pub use transport::{InMemoryTransport, PlayerSnapshot, RoomTransport, TransportError};
