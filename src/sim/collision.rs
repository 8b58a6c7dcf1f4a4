//! Collision Detection
//!
//! Footprint-vs-obstacle and footprint-vs-edge tests. The footprint is a
//! square smaller than the visual sprite, centered within it; collision
//! against an obstacle requires simultaneous horizontal AND vertical overlap
//! with either the upper or the lower pipe rectangle.

use crate::core::config::SimConfig;
use crate::sim::state::{BirdState, Obstacle};

/// The bird's collision footprint as an axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    /// Left edge.
    pub left: f32,
    /// Right edge.
    pub right: f32,
    /// Top edge.
    pub top: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl Footprint {
    /// Footprint centered on the bird.
    pub fn of(bird: &BirdState, config: &SimConfig) -> Self {
        let half = config.footprint_half;
        Self {
            left: bird.x - half,
            right: bird.x + half,
            top: bird.y - half,
            bottom: bird.y + half,
        }
    }
}

/// Screen-edge collision: the footprint's top crossed above y=0 or its
/// bottom crossed below the play-field height.
#[inline]
pub fn hits_edge(footprint: &Footprint, config: &SimConfig) -> bool {
    footprint.top < 0.0 || footprint.bottom > config.field_height
}

/// Obstacle collision against either pipe of a pair.
pub fn hits_obstacle(footprint: &Footprint, obstacle: &Obstacle, config: &SimConfig) -> bool {
    // Horizontal overlap is a precondition for both pipes.
    let horizontal =
        footprint.right > obstacle.x && footprint.left < obstacle.x + config.pipe_width;
    if !horizontal {
        return false;
    }

    // Upper pipe spans [0, gap_top].
    let upper = footprint.bottom > 0.0 && footprint.top < obstacle.gap_top;
    // Lower pipe spans [gap_top + gap_size, field_height].
    let lower = footprint.top < config.field_height
        && footprint.bottom > obstacle.gap_top + config.gap_size;

    upper || lower
}

/// Full collision test for one tick. Returns true on the first hit.
pub fn check_collision(bird: &BirdState, obstacles: &[Obstacle], config: &SimConfig) -> bool {
    let footprint = Footprint::of(bird, config);

    if hits_edge(&footprint, config) {
        return true;
    }

    obstacles
        .iter()
        .any(|obstacle| hits_obstacle(&footprint, obstacle, config))
}
