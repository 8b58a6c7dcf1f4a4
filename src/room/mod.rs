//! Room / Player State Machine
//!
//! The shared multiplayer match model: rooms identified by short codes,
//! self-owned participant rows, and the service that enforces the
//! join/ready/start/finish lifecycle.

pub mod code;
pub mod service;
pub mod state;

pub use service::{RoomError, RoomService, COUNTDOWN, MAX_CODE_ATTEMPTS, ROOM_CAP};
pub use state::{PlayerEvent, Room, RoomPhase, RoomPlayer, UserId};
