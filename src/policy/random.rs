//! Random eviction.
//!
//! Picks a victim uniformly at random from the tracked keys. A baseline with
//! no access tracking at all.
//!
//! ## Architecture
//!
//! ```text
//!   keys: Vec<K>                 positions: FxHashMap<K, usize>
//!   ┌─────┬─────┬─────┬─────┐    ┌──────┬─────┐
//!   │  A  │  B  │  C  │  D  │    │  A   │  0  │
//!   └─────┴─────┴─────┴─────┘    │  B   │  1  │ ...
//!
//!   remove_key(B):  swap B with last (D), pop, fix D's position
//!                   keys = [A, D, C]
//! ```
//!
//! Sampling draws from a seeded [`XorShift64`] kept in a `Cell`, so the
//! candidate query stays `&self` and reproducible for a given seed.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::ds::XorShift64;
use crate::traits::{CacheKey, EvictionStrategy};

/// Uniformly random eviction.
///
/// # Example
///
/// ```
/// use cacheplex::policy::RandomStrategy;
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut random = RandomStrategy::with_seed(7);
/// for k in 0..10u32 {
///     random.record_add(&k, None);
/// }
/// let victim = random.eviction_key().unwrap();
/// assert!(victim < 10);
/// ```
#[derive(Debug)]
pub struct RandomStrategy<K> {
    keys: Vec<K>,
    positions: FxHashMap<K, usize>,
    rng: XorShift64,
}

impl<K: CacheKey> RandomStrategy<K> {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Creates a strategy whose samples are reproducible for `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            keys: Vec::new(),
            positions: FxHashMap::default(),
            rng: XorShift64::new(seed),
        }
    }

    fn track(&mut self, key: &K) {
        if self.positions.contains_key(key) {
            return;
        }
        self.positions.insert(key.clone(), self.keys.len());
        self.keys.push(key.clone());
    }

    #[cfg(any(test, debug_assertions))]
    fn debug_validate_invariants(&self) {
        debug_assert_eq!(self.keys.len(), self.positions.len());
        for (i, key) in self.keys.iter().enumerate() {
            debug_assert_eq!(self.positions.get(key), Some(&i));
        }
    }
}

impl<K: CacheKey> Default for RandomStrategy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey> EvictionStrategy<K> for RandomStrategy<K> {
    fn name(&self) -> &str {
        "Random"
    }

    fn record_add(&mut self, key: &K, _ttl: Option<Duration>) {
        self.track(key);
    }

    fn record_access(&mut self, key: &K) {
        self.track(key);
    }

    fn eviction_key(&self) -> Option<K> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = self.rng.next_below(self.keys.len());
        self.keys.get(idx).cloned()
    }

    fn remove_key(&mut self, key: &K) {
        let Some(idx) = self.positions.remove(key) else {
            return;
        };
        self.keys.swap_remove(idx);
        if let Some(moved) = self.keys.get(idx) {
            if let Some(pos) = self.positions.get_mut(moved) {
                *pos = idx;
            }
        }

        #[cfg(debug_assertions)]
        self.debug_validate_invariants();
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.positions.clear();
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }
}
