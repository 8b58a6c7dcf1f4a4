//! Simulation Events
//!
//! Events generated during a run, consumed by the sync layer and the score
//! recorder. A closed tagged union so downstream handling is exhaustively
//! checkable.

use serde::{Deserialize, Serialize};

use crate::sim::state::Phase;

/// An event produced by the simulation engine during a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// The engine moved to a new phase.
    PhaseChanged {
        /// Phase before the transition.
        from: Phase,
        /// Phase after the transition.
        to: Phase,
    },

    /// An obstacle was passed and credited.
    Scored {
        /// Obstacle that was credited.
        obstacle_id: u64,
        /// New total score.
        score: u32,
    },

    /// The bird collided; the run is effectively over.
    Died {
        /// Vertical position at the moment of impact.
        bird_y: f32,
    },

    /// The bird settled on the ground and the run ended.
    RunEnded {
        /// Final score.
        score: u32,
        /// Obstacles passed (equals score under current rules).
        obstacles_passed: u32,
    },
}

impl SimEvent {
    /// Whether this event must be broadcast immediately, bypassing any
    /// coalescing. Death is latency-sensitive and must not be dropped.
    pub fn is_urgent(&self) -> bool {
        matches!(self, SimEvent::Died { .. })
    }
}
