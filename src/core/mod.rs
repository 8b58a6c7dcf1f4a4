//! Deterministic primitives shared by the simulation and sync layers.
//!
//! Everything here is pure and synchronous: the seeded PRNG that keeps
//! obstacle layouts identical across clients, and the viewport-relative
//! tuning constants.

pub mod config;
pub mod rng;

pub use config::{SimConfig, Viewport, SETTLE_TICKS};
pub use rng::{derive_room_seed, SeededRng};
