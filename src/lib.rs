//! # Wingbeat Engine
//!
//! Deterministic flappy-style game kernel with a multiplayer room layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WINGBEAT ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Seeded LCG PRNG + room seed derivation    │
//! │  └── config.rs   - Viewport-relative simulation constants    │
//! │                                                              │
//! │  sim/            - Game logic (deterministic)                │
//! │  ├── state.rs    - Phase, bird and obstacle state            │
//! │  ├── engine.rs   - Fixed-step simulation loop                │
//! │  ├── collision.rs- Footprint vs gap/edge detection           │
//! │  └── events.rs   - Per-tick simulation events                │
//! │                                                              │
//! │  room/           - Match model (shared)                      │
//! │  ├── code.rs     - Short join codes                          │
//! │  ├── state.rs    - Room and participant rows                 │
//! │  └── service.rs  - Join/ready/start/finish lifecycle         │
//! │                                                              │
//! │  sync/           - Multiplayer bridge (non-deterministic)    │
//! │  ├── transport.rs- Backend trait + in-memory impl            │
//! │  ├── debounce.rs - Coalescing outbound channel               │
//! │  └── coordinator.rs - Ghost projection and auto-finish       │
//! │                                                              │
//! │  persist.rs      - Best-effort run recording                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `sim/` modules are deterministic: all randomness comes
//! from the seeded LCG, iteration uses `BTreeMap`/ordered `Vec`s, and the
//! fixed-step loop never reads wall-clock time. Two engines built with the
//! same seed and viewport, fed the same flap ticks, produce bit-identical
//! obstacle layouts, scores and phase transitions. The sync layer never
//! feeds back into local physics, so multiplayer cannot break replay.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod persist;
pub mod room;
pub mod sim;
pub mod sync;

// Re-export commonly used types
pub use crate::core::{derive_room_seed, SeededRng, SimConfig, Viewport};
pub use crate::room::{RoomError, RoomService};
pub use crate::sim::{Engine, Phase, SimEvent};
pub use crate::sync::{InMemoryTransport, SyncCoordinator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
