//! Simulation Engine
//!
//! One player's deterministic physics, obstacle stream, collision detection
//! and scoring, independent of any network state.

pub mod collision;
pub mod engine;
pub mod events;
pub mod state;

pub use engine::{Engine, TickResult};
pub use events::SimEvent;
pub use state::{BirdState, Obstacle, Phase, RenderSnapshot, SimState};
