//! Adaptive LRU/LFU blend.
//!
//! Runs an [`LruStrategy`] and an [`LfuStrategy`] side by side over the same
//! keys and picks each eviction candidate from one of them by a weighted
//! coin flip. The weight drifts with the observed hit rate:
//!
//! ```text
//!   every 100 recorded operations (adds + accesses):
//!
//!     hit_rate = accesses of tracked keys / operations
//!
//!     hit_rate < 0.3  →  lru_weight += 0.05   (churny workload, favour recency)
//!     hit_rate > 0.7  →  lru_weight -= 0.05   (stable hot set, favour frequency)
//!
//!     lru_weight is clamped to [0.2, 0.8]
//!
//!   eviction_key():
//!     roll < lru_weight  →  LRU candidate
//!     otherwise          →  LFU candidate
//! ```
//!
//! The coin flip uses a seeded [`XorShift64`], so tests can pin the sequence.

use std::time::Duration;

use tracing::trace;

use crate::ds::XorShift64;
use crate::policy::lfu::LfuStrategy;
use crate::policy::lru::LruStrategy;
use crate::traits::{CacheKey, EvictionStrategy};

/// Lower bound of the LRU weight.
pub const MIN_LRU_WEIGHT: f64 = 0.2;
/// Upper bound of the LRU weight.
pub const MAX_LRU_WEIGHT: f64 = 0.8;
/// Operations between weight adjustments.
pub const ADAPT_INTERVAL: u64 = 100;

const WEIGHT_STEP: f64 = 0.05;
const LOW_HIT_RATE: f64 = 0.3;
const HIGH_HIT_RATE: f64 = 0.7;

/// Weighted blend of LRU and LFU.
///
/// # Example
///
/// ```
/// use cacheplex::policy::AdaptiveStrategy;
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut adaptive = AdaptiveStrategy::with_seed(1);
/// adaptive.record_add(&"a", None);
/// adaptive.record_add(&"b", None);
/// assert!(adaptive.eviction_key().is_some());
/// assert!((0.2..=0.8).contains(&adaptive.lru_weight()));
/// ```
#[derive(Debug)]
pub struct AdaptiveStrategy<K> {
    lru: LruStrategy<K>,
    lfu: LfuStrategy<K>,
    lru_weight: f64,
    initial_weight: f64,
    window_ops: u64,
    window_hits: u64,
    rng: XorShift64,
}

impl<K: CacheKey> AdaptiveStrategy<K> {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Creates a strategy with a reproducible coin flip.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            lru: LruStrategy::new(),
            lfu: LfuStrategy::new(),
            lru_weight: 0.5,
            initial_weight: 0.5,
            window_ops: 0,
            window_hits: 0,
            rng: XorShift64::new(seed),
        }
    }

    /// Overrides the starting weight (clamped into range). `clear` returns to it.
    pub fn with_lru_weight(mut self, weight: f64) -> Self {
        self.initial_weight = weight.clamp(MIN_LRU_WEIGHT, MAX_LRU_WEIGHT);
        self.lru_weight = self.initial_weight;
        self
    }

    /// Current probability of choosing the LRU candidate.
    pub fn lru_weight(&self) -> f64 {
        self.lru_weight
    }

    /// The inner LRU ranking.
    pub fn lru(&self) -> &LruStrategy<K> {
        &self.lru
    }

    /// The inner LFU ranking.
    pub fn lfu(&self) -> &LfuStrategy<K> {
        &self.lfu
    }

    fn observe(&mut self, hit: bool) {
        self.window_ops += 1;
        if hit {
            self.window_hits += 1;
        }
        if self.window_ops < ADAPT_INTERVAL {
            return;
        }

        let hit_rate = self.window_hits as f64 / self.window_ops as f64;
        let before = self.lru_weight;
        if hit_rate < LOW_HIT_RATE {
            self.lru_weight += WEIGHT_STEP;
        } else if hit_rate > HIGH_HIT_RATE {
            self.lru_weight -= WEIGHT_STEP;
        }
        self.lru_weight = self.lru_weight.clamp(MIN_LRU_WEIGHT, MAX_LRU_WEIGHT);
        trace!(hit_rate, before, after = self.lru_weight, "adaptive weight adjusted");

        self.window_ops = 0;
        self.window_hits = 0;
    }
}

impl<K: CacheKey> Default for AdaptiveStrategy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey> EvictionStrategy<K> for AdaptiveStrategy<K> {
    fn name(&self) -> &str {
        "Adaptive"
    }

    fn record_add(&mut self, key: &K, ttl: Option<Duration>) {
        self.lru.record_add(key, ttl);
        self.lfu.record_add(key, ttl);
        self.observe(false);
    }

    fn record_access(&mut self, key: &K) {
        let hit = self.lru.contains(key);
        self.lru.record_access(key);
        self.lfu.record_access(key);
        self.observe(hit);
    }

    fn eviction_key(&self) -> Option<K> {
        match (self.lru.eviction_key(), self.lfu.eviction_key()) {
            (Some(by_recency), Some(by_frequency)) => {
                if self.rng.next_f64() < self.lru_weight {
                    Some(by_recency)
                } else {
                    Some(by_frequency)
                }
            },
            (lru, lfu) => lru.or(lfu),
        }
    }

    fn remove_key(&mut self, key: &K) {
        self.lru.remove_key(key);
        self.lfu.remove_key(key);
    }

    fn clear(&mut self) {
        self.lru.clear();
        self.lfu.clear();
        self.lru_weight = self.initial_weight;
        self.window_ops = 0;
        self.window_hits = 0;
    }

    fn len(&self) -> usize {
        self.lru.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.lru.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_balanced() {
        let adaptive: AdaptiveStrategy<u32> = AdaptiveStrategy::new();
        assert_eq!(adaptive.lru_weight(), 0.5);
        assert_eq!(adaptive.eviction_key(), None);
    }

    #[test]
    fn candidate_comes_from_one_of_the_inner_strategies() {
        let mut adaptive = AdaptiveStrategy::with_seed(3);
        for k in 0..5u32 {
            adaptive.record_add(&k, None);
        }
        for _ in 0..3 {
            adaptive.record_access(&0);
        }
        adaptive.record_access(&1);
        // LRU candidate is 2 (oldest untouched), LFU candidate is 2 as well
        // (frequency 1, oldest tick).
        assert_eq!(adaptive.lru().eviction_key(), Some(2));
        assert_eq!(adaptive.lfu().eviction_key(), Some(2));
        assert_eq!(adaptive.eviction_key(), Some(2));
    }

    #[test]
    fn weight_extremes_pick_matching_inner_candidate() {
        let mut adaptive = AdaptiveStrategy::with_seed(11).with_lru_weight(0.8);
        adaptive.record_add(&"a", None);
        adaptive.record_add(&"b", None);
        for _ in 0..5 {
            adaptive.record_access(&"a");
        }
        adaptive.record_access(&"b");
        // LRU says "a" (touched before the last "b"), LFU says "b".
        let lru_pick = adaptive.lru().eviction_key();
        let lfu_pick = adaptive.lfu().eviction_key();
        assert_eq!(lru_pick, Some("a"));
        assert_eq!(lfu_pick, Some("b"));

        let mut lru_count = 0;
        for _ in 0..1_000 {
            let pick = adaptive.eviction_key();
            assert!(pick == lru_pick || pick == lfu_pick);
            if pick == lru_pick {
                lru_count += 1;
            }
        }
        // Weight 0.8: LRU wins clearly more often than LFU.
        assert!(lru_count > 650, "lru chosen {lru_count} times");
    }

    #[test]
    fn low_hit_rate_moves_towards_lru() {
        let mut adaptive = AdaptiveStrategy::with_seed(1);
        for k in 0..ADAPT_INTERVAL as u32 {
            adaptive.record_add(&k, None);
        }
        assert!(adaptive.lru_weight() > 0.5);
    }

    #[test]
    fn high_hit_rate_moves_towards_lfu() {
        let mut adaptive = AdaptiveStrategy::with_seed(1);
        adaptive.record_add(&0u32, None);
        for _ in 0..(ADAPT_INTERVAL - 1) {
            adaptive.record_access(&0);
        }
        assert!(adaptive.lru_weight() < 0.5);
    }

    #[test]
    fn weight_saturates_at_bounds() {
        let mut adaptive = AdaptiveStrategy::with_seed(1);
        for k in 0..(ADAPT_INTERVAL as u32 * 50) {
            adaptive.record_add(&k, None);
        }
        assert_eq!(adaptive.lru_weight(), MAX_LRU_WEIGHT);

        adaptive.record_add(&u32::MAX, None);
        for _ in 0..(ADAPT_INTERVAL * 50) {
            adaptive.record_access(&u32::MAX);
        }
        assert_eq!(adaptive.lru_weight(), MIN_LRU_WEIGHT);
    }

    #[test]
    fn remove_key_syncs_both_inner_strategies() {
        let mut adaptive = AdaptiveStrategy::new();
        adaptive.record_add(&"a", None);
        adaptive.remove_key(&"a");
        adaptive.remove_key(&"a");
        assert!(!adaptive.lru().contains(&"a"));
        assert!(!adaptive.lfu().contains(&"a"));
        assert_eq!(adaptive.eviction_key(), None);
    }

    #[test]
    fn clear_restores_initial_weight() {
        let mut adaptive = AdaptiveStrategy::with_seed(1);
        for k in 0..1_000u32 {
            adaptive.record_add(&k, None);
        }
        assert_eq!(adaptive.lru_weight(), MAX_LRU_WEIGHT);

        adaptive.clear();
        assert_eq!(adaptive.lru_weight(), 0.5);
        assert!(adaptive.is_empty());
        assert_eq!(adaptive.eviction_key(), None);
    }

    #[test]
    fn clear_keeps_configured_starting_weight() {
        let mut adaptive = AdaptiveStrategy::with_seed(1).with_lru_weight(0.3);
        adaptive.record_add(&0u32, None);
        for _ in 0..(ADAPT_INTERVAL * 10) {
            adaptive.record_access(&0);
        }
        assert_eq!(adaptive.lru_weight(), MIN_LRU_WEIGHT);

        adaptive.clear();
        assert_eq!(adaptive.lru_weight(), 0.3);

        // The hit window restarts too: a fresh window of misses moves up one step.
        for k in 0..ADAPT_INTERVAL as u32 {
            adaptive.record_add(&k, None);
        }
        assert!((adaptive.lru_weight() - (0.3 + WEIGHT_STEP)).abs() < 1e-9);
    }

    proptest! {
        /// lru_weight stays in [0.2, 0.8] for any access pattern.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_weight_within_bounds(
            seed in any::<u64>(),
            ops in prop::collection::vec((any::<bool>(), 0u16..64), 0..2_000)
        ) {
            let mut adaptive = AdaptiveStrategy::with_seed(seed);
            for (is_add, key) in ops {
                if is_add {
                    adaptive.record_add(&key, None);
                } else {
                    adaptive.record_access(&key);
                }
                let w = adaptive.lru_weight();
                prop_assert!((MIN_LRU_WEIGHT..=MAX_LRU_WEIGHT).contains(&w));
            }
        }
    }
}
