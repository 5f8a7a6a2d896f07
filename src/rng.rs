//! Seeded random stream shared by every generation phase
//!
//! Peers regenerate a level from the seed string alone, so every random
//! decision in the pipeline is drawn from one [`LevelRng`] in a fixed order.
//! The stream is passed explicitly to each phase; there is no global state.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

/// Deterministic random stream seeded from a level seed string
#[derive(Debug, Clone)]
pub struct LevelRng {
    inner: ChaCha8Rng,
}

impl LevelRng {
    /// Create a stream from a seed string
    ///
    /// The same string always yields the same sequence on every platform.
    pub fn from_seed_str(seed: &str) -> Self {
        Self::from_seed_u64(hash_seed(seed))
    }

    /// Create a stream from a numeric seed
    pub fn from_seed_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Integer in `[min, max)`; returns `min` when the range is empty
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..max)
    }

    /// Float in `[min, max)`; returns `min` when the range is empty
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..max)
    }

    /// Index in `[0, count)`; returns 0 for an empty collection
    pub fn index(&mut self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        self.inner.gen_range(0..count)
    }

    /// Uniform draw in `[0, 1)`
    pub fn unit(&mut self) -> f32 {
        self.inner.gen_range(0.0..1.0)
    }

    /// Random direction of the given length
    pub fn vector(&mut self, length: f32) -> Vec2 {
        let angle = self.range_f32(0.0, TAU);
        Vec2::new(angle.cos(), angle.sin()) * length
    }

    /// Non-negative integer in `[0, i32::MAX)`
    pub fn next_i32(&mut self) -> i32 {
        self.inner.gen_range(0..i32::MAX)
    }
}

/// Stable 64-bit FNV-1a hash of a seed string
///
/// Independent of `std`'s per-process hasher keys.
pub fn hash_seed(seed: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    seed.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}
