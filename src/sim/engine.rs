//! Simulation Engine
//!
//! One player's fixed-step physics, obstacle stream, collision and scoring
//! loop. Runs identically in single-player and multiplayer; the sync layer
//! never feeds anything back into it.
//!
//! Every operation called from a phase that does not permit it is a silent
//! no-op. UI code relies on being able to call `flap` unconditionally, so
//! this must never become an error path.

use crate::core::config::{SimConfig, SETTLE_TICKS};
use crate::sim::collision::{check_collision, Footprint};
use crate::sim::events::SimEvent;
use crate::sim::state::{Obstacle, Phase, RenderSnapshot, SimState};

/// Result of one tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick.
    pub events: Vec<SimEvent>,
}

/// A single player's simulation engine.
///
/// Pure and synchronous: `tick` never suspends and is driven by an external
/// frame scheduler, one call per frame.
#[derive(Clone, Debug)]
pub struct Engine {
    config: SimConfig,
    state: SimState,
    seed: u64,
}

impl Engine {
    /// Create an engine in `Ready` with the given obstacle seed.
    pub fn new(seed: u64, config: SimConfig) -> Self {
        let state = SimState::new(seed, &config);
        Self {
            config,
            state,
            seed,
        }
    }

    /// Begin the run. Valid only from `Ready`; otherwise a no-op.
    ///
    /// Gives the bird an initial upward impulse and pre-populates the
    /// obstacle stream across the field plus a buffer so none pop in.
    pub fn start(&mut self) {
        if self.state.phase != Phase::Ready {
            return;
        }

        self.state.bird.velocity = self.config.flap_impulse;

        // First obstacle enters at the right edge; the rest fill the
        // spawn horizon at fixed spacing.
        self.spawn_obstacle(self.config.field_width);
        self.maintain_stream();

        self.set_phase(Phase::Playing);
    }

    /// Flap: set velocity to the fixed upward impulse, overriding any
    /// current velocity. Valid only in `Playing`; otherwise a no-op.
    pub fn flap(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        self.state.bird.velocity = self.config.flap_impulse;
    }

    /// Reset for a fresh run. Valid only from `Over`; otherwise a no-op.
    ///
    /// Restores the obstacle RNG to its seed, so a restarted run replays
    /// the same layout as a fresh engine with the same seed.
    pub fn restart(&mut self) {
        if self.state.phase != Phase::Over {
            return;
        }
        self.state = SimState::new(self.seed, &self.config);
        self.state.push_event(SimEvent::PhaseChanged {
            from: Phase::Over,
            to: Phase::Ready,
        });
    }

    /// Advance one fixed simulation step.
    pub fn tick(&mut self) -> TickResult {
        match self.state.phase {
            // No physics before launch or after the run has ended.
            Phase::Ready | Phase::Over => {}
            Phase::Playing => {
                self.state.tick += 1;
                self.apply_gravity();
                self.advance_obstacles();
                self.credit_passes();
                self.despawn_offscreen();
                self.maintain_stream();

                if check_collision(&self.state.bird, &self.state.obstacles, &self.config) {
                    // This tick's physics update stands; the bird simply
                    // stops being alive and obstacles freeze from now on.
                    self.state.bird.alive = false;
                    self.state.push_event(SimEvent::Died {
                        bird_y: self.state.bird.y,
                    });
                    self.set_phase(Phase::Impact);
                }
            }
            Phase::Impact => {
                self.state.tick += 1;
                // Gravity never pauses; the bird keeps falling while the
                // obstacles stay frozen.
                self.apply_gravity();
                self.settle_toward_over();
            }
        }

        TickResult {
            events: self.state.take_events(),
        }
    }

    /// Read-only snapshot for the render target, once per tick.
    pub fn snapshot(&self) -> RenderSnapshot<'_> {
        RenderSnapshot {
            phase: self.state.phase,
            bird: self.state.bird,
            obstacles: &self.state.obstacles,
            score: self.state.score,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Current score.
    pub fn score(&self) -> u32 {
        self.state.score
    }

    /// Full simulation state (read-only).
    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Resolved tuning constants.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.state.phase;
        self.state.phase = to;
        self.state.push_event(SimEvent::PhaseChanged { from, to });
    }

    fn apply_gravity(&mut self) {
        self.state.bird.velocity += self.config.gravity;
        self.state.bird.y += self.state.bird.velocity;
    }

    fn advance_obstacles(&mut self) {
        for obstacle in &mut self.state.obstacles {
            obstacle.x -= self.config.pipe_speed;
        }
    }

    /// Credit score exactly once per obstacle, the instant its trailing
    /// edge passes the bird's x. The `passed` flag guards against repeated
    /// credit on later ticks.
    fn credit_passes(&mut self) {
        let bird_x = self.state.bird.x;
        let pipe_width = self.config.pipe_width;
        let mut scored = Vec::new();

        for obstacle in &mut self.state.obstacles {
            if !obstacle.passed && obstacle.x + pipe_width < bird_x {
                obstacle.passed = true;
                scored.push(obstacle.id);
            }
        }

        for id in scored {
            self.state.score += 1;
            let score = self.state.score;
            self.state.push_event(SimEvent::Scored {
                obstacle_id: id,
                score,
            });
        }
    }

    fn despawn_offscreen(&mut self) {
        let pipe_width = self.config.pipe_width;
        self.state
            .obstacles
            .retain(|obstacle| obstacle.x + pipe_width >= 0.0);
    }

    /// Keep the stream topped up: whenever the rightmost obstacle has come
    /// within one spacing of the spawn horizon, place the next one, bounded
    /// by the obstacle cap.
    fn maintain_stream(&mut self) {
        let horizon = self.config.field_width * 2.0;
        loop {
            if self.state.obstacles.len() >= self.config.max_obstacles {
                break;
            }
            let next_x = match self.state.obstacles.last() {
                Some(rightmost) => rightmost.x + self.config.pipe_spacing,
                None => self.config.field_width,
            };
            if next_x > horizon {
                break;
            }
            self.spawn_obstacle(next_x);
        }
    }

    fn spawn_obstacle(&mut self, x: f32) {
        let gap_top = self
            .state
            .rng
            .next_range(self.config.gap_top_min(), self.config.gap_top_max());
        let id = self.state.next_obstacle_id;
        self.state.next_obstacle_id += 1;
        self.state.obstacles.push(Obstacle {
            id,
            x,
            gap_top,
            passed: false,
        });
    }

    /// In `Impact`: once the footprint's bottom reaches the ground line,
    /// pin the bird there and run a short visual-settle delay before the
    /// deferred transition to `Over`.
    fn settle_toward_over(&mut self) {
        if let Some(remaining) = self.state.settle_remaining {
            // Keep the bird resting on the ground while the delay runs;
            // gravity still integrated above.
            self.state.bird.y = self.config.field_height - self.config.footprint_half;
            if remaining == 0 {
                let score = self.state.score;
                self.state.push_event(SimEvent::RunEnded {
                    score,
                    obstacles_passed: score,
                });
                self.set_phase(Phase::Over);
            } else {
                self.state.settle_remaining = Some(remaining - 1);
            }
            return;
        }

        let footprint = Footprint::of(&self.state.bird, &self.config);
        if footprint.bottom >= self.config.field_height {
            self.state.bird.y = self.config.field_height - self.config.footprint_half;
            self.state.settle_remaining = Some(SETTLE_TICKS);
        }
    }
}
