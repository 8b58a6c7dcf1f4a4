//! Simulation Tuning
//!
//! All physics and layout constants are expressed relative to the viewport
//! so the same relative difficulty holds across screen sizes. The per-tick
//! time step is baked into the constants (60 Hz fixed step).

use serde::{Deserialize, Serialize};

/// Gravity per tick, as a fraction of viewport height.
const GRAVITY_FRAC: f32 = 0.0012;
/// Flap impulse (upward), as a fraction of viewport height.
const FLAP_IMPULSE_FRAC: f32 = 0.015;
/// Obstacle scroll speed per tick, as a fraction of viewport width.
const PIPE_SPEED_FRAC: f32 = 0.005;
/// Horizontal distance between consecutive obstacles, fraction of width.
const PIPE_SPACING_FRAC: f32 = 0.45;
/// Obstacle width, fraction of viewport width.
const PIPE_WIDTH_FRAC: f32 = 0.13;
/// Gap between upper and lower pipe, fraction of viewport height.
const GAP_FRAC: f32 = 0.28;
/// Absolute minimum gap in pixels. The gap is the larger of this and
/// `GAP_FRAC * height`, so it is always navigable.
const GAP_MIN: f32 = 120.0;
/// Minimum clearance between the gap and either screen edge, fraction of height.
const EDGE_CLEARANCE_FRAC: f32 = 0.08;
/// Bird's fixed horizontal position, fraction of viewport width.
const BIRD_X_FRAC: f32 = 0.25;
/// Side of the square collision footprint, fraction of viewport height.
/// Smaller than the visual sprite by design of the collision rule.
const FOOTPRINT_FRAC: f32 = 0.045;

/// Ticks the bird rests on the ground after Impact before the run ends.
pub const SETTLE_TICKS: u32 = 45;

/// Viewport dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        // Portrait phone-ish default used by the demo and tests.
        Self {
            width: 480.0,
            height: 640.0,
        }
    }
}

/// Resolved per-tick simulation constants for one viewport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Play-field width (viewport width).
    pub field_width: f32,
    /// Play-field height; the ground line sits at this y.
    pub field_height: f32,
    /// Downward velocity increment per tick.
    pub gravity: f32,
    /// Velocity set (not added) by a flap; negative = upward.
    pub flap_impulse: f32,
    /// Leftward obstacle movement per tick.
    pub pipe_speed: f32,
    /// Horizontal distance between consecutive obstacles.
    pub pipe_spacing: f32,
    /// Obstacle width.
    pub pipe_width: f32,
    /// Vertical gap between the upper and lower pipe.
    pub gap_size: f32,
    /// Minimum distance between the gap and either screen edge.
    pub edge_clearance: f32,
    /// Bird's fixed x position.
    pub bird_x: f32,
    /// Half-side of the square collision footprint.
    pub footprint_half: f32,
    /// Upper bound on live obstacles.
    pub max_obstacles: usize,
}

impl SimConfig {
    /// Resolve constants for a viewport.
    pub fn for_viewport(viewport: Viewport) -> Self {
        let w = viewport.width;
        let h = viewport.height;

        // Enough obstacles to cover the field plus one spacing of buffer
        // beyond the right edge, so none ever pop in.
        let spacing = PIPE_SPACING_FRAC * w;
        let max_obstacles = ((w / spacing).ceil() as usize) + 3;

        Self {
            field_width: w,
            field_height: h,
            gravity: GRAVITY_FRAC * h,
            flap_impulse: -(FLAP_IMPULSE_FRAC * h),
            pipe_speed: PIPE_SPEED_FRAC * w,
            pipe_spacing: spacing,
            pipe_width: PIPE_WIDTH_FRAC * w,
            gap_size: GAP_MIN.max(GAP_FRAC * h),
            edge_clearance: EDGE_CLEARANCE_FRAC * h,
            bird_x: BIRD_X_FRAC * w,
            footprint_half: FOOTPRINT_FRAC * h / 2.0,
            max_obstacles,
        }
    }

    /// Lowest permitted gap top (upper pipe height).
    #[inline]
    pub fn gap_top_min(&self) -> f32 {
        self.edge_clearance
    }

    /// Highest permitted gap top, leaving clearance below the gap.
    #[inline]
    pub fn gap_top_max(&self) -> f32 {
        self.field_height - self.edge_clearance - self.gap_size
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::for_viewport(Viewport::default())
    }
}
