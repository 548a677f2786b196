//! Least Frequently Used eviction.
//!
//! ## Architecture
//!
//! ```text
//!   ranking: MinHeap<K, (frequency, last_tick)>
//!
//!              [0] ("b", (1, 2))         ← victim: lowest frequency,
//!             /                 \           oldest last access on ties
//!   [1] ("c", (1, 3))     [2] ("a", (3, 6))
//!
//!   tick: 6   (logical clock, +1 on every add/access)
//! ```
//!
//! The heap's index map doubles as the key → (frequency, last access) map,
//! so a lookup, a bump and a removal are all O(log n) at worst. A logical
//! tick stands in for wall-clock access time: it orders accesses the same
//! way and never produces ties.

use std::time::Duration;

use crate::ds::MinHeap;
use crate::traits::{CacheKey, EvictionStrategy};

/// Frequency-ordered eviction with recency tie-break.
///
/// # Example
///
/// ```
/// use cacheplex::policy::LfuStrategy;
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut lfu = LfuStrategy::new();
/// lfu.record_add(&"hot", None);
/// lfu.record_add(&"cold", None);
/// lfu.record_access(&"hot");
/// assert_eq!(lfu.frequency(&"hot"), Some(2));
/// assert_eq!(lfu.eviction_key(), Some("cold"));
/// ```
#[derive(Debug)]
pub struct LfuStrategy<K> {
    ranking: MinHeap<K, (u64, u64)>,
    tick: u64,
}

impl<K: CacheKey> LfuStrategy<K> {
    pub fn new() -> Self {
        Self {
            ranking: MinHeap::new(),
            tick: 0,
        }
    }

    /// Access count of `key`, counting the initial add.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.ranking.priority_of(key).map(|(freq, _)| freq)
    }

    /// Logical time of the last add/access of `key`.
    pub fn last_access(&self, key: &K) -> Option<u64> {
        self.ranking.priority_of(key).map(|(_, tick)| tick)
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

impl<K: CacheKey> Default for LfuStrategy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey> EvictionStrategy<K> for LfuStrategy<K> {
    fn name(&self) -> &str {
        "LFU"
    }

    fn record_add(&mut self, key: &K, _ttl: Option<Duration>) {
        if self.ranking.contains(key) {
            self.record_access(key);
            return;
        }
        let tick = self.next_tick();
        self.ranking.insert((1, tick), key.clone());
    }

    fn record_access(&mut self, key: &K) {
        let tick = self.next_tick();
        let freq = self.frequency(key).map_or(1, |f| f.saturating_add(1));
        self.ranking.insert((freq, tick), key.clone());
    }

    fn eviction_key(&self) -> Option<K> {
        self.ranking.peek().map(|(_, key)| key.clone())
    }

    fn remove_key(&mut self, key: &K) {
        self.ranking.remove(key);
    }

    fn clear(&mut self) {
        self.ranking.clear();
        self.tick = 0;
    }

    fn len(&self) -> usize {
        self.ranking.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.ranking.contains(key)
    }
}
