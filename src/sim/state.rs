//! Simulation State Definitions
//!
//! All state owned by a single engine instance. One `SimState` per player;
//! nothing here is ever shared or mutated across clients.

use serde::{Deserialize, Serialize};

use crate::core::config::SimConfig;
use crate::core::rng::SeededRng;
use crate::sim::events::SimEvent;

/// Phase of a single player's run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for a start signal.
    #[default]
    Ready,
    /// Gravity, obstacle motion, input and collision all active.
    Playing,
    /// Collision detected: the bird keeps falling, obstacles freeze,
    /// input is ignored.
    Impact,
    /// Terminal for the run; exposes the final score, accepts `restart`.
    Over,
}

/// The bird owned by one engine. `x` is fixed post-launch; `y` is the only
/// mutable axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BirdState {
    /// Fixed horizontal position.
    pub x: f32,
    /// Vertical position (0 at the top of the field).
    pub y: f32,
    /// Vertical velocity; positive = downward.
    pub velocity: f32,
    /// False once a collision has been detected.
    pub alive: bool,
}

impl BirdState {
    /// Bird at launch position: fixed x, mid-screen y, at rest.
    pub fn at_launch(config: &SimConfig) -> Self {
        Self {
            x: config.bird_x,
            y: config.field_height / 2.0,
            velocity: 0.0,
            alive: true,
        }
    }
}

/// A pipe pair: an upper pipe of height `gap_top` and a lower pipe starting
/// at `gap_top + gap_size`, sharing one x position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Monotonic id, unique within a run.
    pub id: u64,
    /// Left edge; decreases each tick while Playing.
    pub x: f32,
    /// Height of the upper pipe (top of the gap).
    pub gap_top: f32,
    /// Whether scoring has already been credited for this obstacle.
    pub passed: bool,
}

/// Aggregate state for one player's run.
///
/// `obstacles` is kept in spawn order, which is also left-to-right order
/// since every obstacle moves at the same speed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimState {
    /// Current phase.
    pub phase: Phase,
    /// The player's bird.
    pub bird: BirdState,
    /// Live obstacles, oldest (leftmost) first.
    pub obstacles: Vec<Obstacle>,
    /// Score; monotonically non-decreasing within a run.
    pub score: u32,
    /// Elapsed simulation steps since Playing began.
    pub tick: u32,
    /// Next obstacle id.
    pub(crate) next_obstacle_id: u64,
    /// Countdown to Over once the bird has reached the ground.
    pub(crate) settle_remaining: Option<u32>,
    /// Gap placement RNG; shared seed keeps layouts identical across clients.
    pub(crate) rng: SeededRng,
    /// Events generated this tick (cleared each tick).
    #[serde(skip)]
    pub(crate) pending_events: Vec<SimEvent>,
}

impl SimState {
    /// Fresh state in `Ready`, bird at launch position.
    pub fn new(seed: u64, config: &SimConfig) -> Self {
        Self {
            phase: Phase::Ready,
            bird: BirdState::at_launch(config),
            obstacles: Vec::new(),
            score: 0,
            tick: 0,
            next_obstacle_id: 0,
            settle_remaining: None,
            rng: SeededRng::new(seed),
            pending_events: Vec::new(),
        }
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Queue an event for this tick.
    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.pending_events.push(event);
    }
}

/// Read-only projection handed to the render target once per tick. The core
/// makes no assumption about how this is drawn.
#[derive(Clone, Debug, Serialize)]
pub struct RenderSnapshot<'a> {
    /// Current phase.
    pub phase: Phase,
    /// The bird.
    pub bird: BirdState,
    /// Live obstacles, leftmost first.
    pub obstacles: &'a [Obstacle],
    /// Current score.
    pub score: u32,
}
