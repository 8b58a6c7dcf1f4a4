//! Seeded Random Generator
//!
//! A linear congruential generator producing a reproducible sequence of
//! floats in [0, 1). Used exclusively for obstacle gap placement so that
//! engines sharing a seed produce identical obstacle layouts without ever
//! transmitting obstacle data over the wire.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// LCG multiplier (Numerical Recipes).
const LCG_A: u64 = 1_664_525;
/// LCG increment.
const LCG_C: u64 = 1_013_904_223;
/// LCG modulus: 2^32.
const LCG_M: u64 = 1 << 32;

/// Deterministic PRNG over the recurrence `state = (a * state + c) mod 2^32`.
///
/// # Determinism Guarantee
///
/// Two generators constructed with the same seed and queried the same number
/// of times produce bit-identical sequences on any platform.
///
/// # Example
///
/// ```
/// use wingbeat::core::rng::SeededRng;
///
/// let mut a = SeededRng::new(12345);
/// let mut b = SeededRng::new(12345);
/// assert_eq!(a.next().to_bits(), b.next().to_bits());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeededRng {
    seed: u64,
    state: u64,
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SeededRng {
    /// Create a new generator from an integer seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            state: seed % LCG_M,
        }
    }

    /// Advance the recurrence and return a float in [0, 1).
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f64 {
        self.state = (LCG_A.wrapping_mul(self.state).wrapping_add(LCG_C)) % LCG_M;
        self.state as f64 / LCG_M as f64
    }

    /// Uniform value in [min, max). Returns `min` when the range is empty.
    #[inline]
    pub fn next_range(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        min + (self.next() as f32) * (max - min)
    }

    /// Uniform integer in [0, max). Returns 0 when `max` is 0.
    #[inline]
    pub fn next_index(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        let idx = (self.next() * max as f64) as usize;
        idx.min(max - 1)
    }

    /// Restore the generator to its original seed.
    pub fn reset(&mut self) {
        self.state = self.seed % LCG_M;
    }

    /// The seed this generator was constructed with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Derive a room seed from the room's identity.
///
/// Hashes a domain separator plus the room UUID so the seed is fixed at room
/// creation, reproducible by every joining client, and not guessable from
/// the room code alone.
pub fn derive_room_seed(room_id: &Uuid) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(b"WINGBEAT_ROOM_SEED_V1");
    hasher.update(room_id.as_bytes());
    let hash = hasher.finalize();
    u64::from_le_bytes(hash[0..8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededRng::new(12345);
        let mut b = SeededRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SeededRng::new(12345);
        let mut b = SeededRng::new(54321);

        assert_ne!(a.next().to_bits(), b.next().to_bits());
    }

    #[test]
    fn test_output_range() {
        let mut rng = SeededRng::new(42);
        for _ in 0..10_000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_reset_replays_sequence() {
        let mut rng = SeededRng::new(9876);
        let first: Vec<u64> = (0..100).map(|_| rng.next().to_bits()).collect();

        rng.reset();
        let replay: Vec<u64> = (0..100).map(|_| rng.next().to_bits()).collect();

        assert_eq!(first, replay);
    }

    #[test]
    fn test_next_range_bounds() {
        let mut rng = SeededRng::new(7);
        for _ in 0..1000 {
            let v = rng.next_range(10.0, 20.0);
            assert!((10.0..20.0).contains(&v));
        }

        // Empty range collapses to min
        assert_eq!(rng.next_range(5.0, 5.0), 5.0);
    }

    #[test]
    fn test_next_index_bounds() {
        let mut rng = SeededRng::new(11);
        for _ in 0..1000 {
            assert!(rng.next_index(33) < 33);
        }
        assert_eq!(rng.next_index(0), 0);
    }

    #[test]
    fn test_derive_room_seed_stable() {
        let id = Uuid::from_u128(0xDEADBEEF);
        assert_eq!(derive_room_seed(&id), derive_room_seed(&id));

        let other = Uuid::from_u128(0xFEEDFACE);
        assert_ne!(derive_room_seed(&id), derive_room_seed(&other));
    }
}
