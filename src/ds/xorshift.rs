//! XorShift64 generator for eviction sampling.
//!
//! Kept in a `Cell` by the Random and Adaptive strategies so that
//! `eviction_key(&self)` can draw a sample without `&mut` access.

use std::cell::Cell;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Small, seedable PRNG. Not suitable for anything security related.
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: Cell<u64>,
}

impl XorShift64 {
    /// Creates a generator; a zero seed is remapped since XorShift has an
    /// all-zero fixed point.
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { GOLDEN_GAMMA } else { seed };
        Self {
            state: Cell::new(seed),
        }
    }

    /// Returns the next value.
    #[inline]
    pub fn next_u64(&self) -> u64 {
        let mut x = self.state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state.set(x);
        x
    }

    /// Returns a value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns a value in `[0, bound)`; `bound` must be non-zero.
    #[inline]
    pub fn next_below(&self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        Self::new(GOLDEN_GAMMA)
    }
}
