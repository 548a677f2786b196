//! Most Recently Used eviction.
//!
//! The inverse of LRU: the key touched last is the one evicted. Useful for
//! cyclic scans larger than the cache, where the newest entry is the one
//! least likely to be needed again soon.
//!
//! Each add/access stamps the key with a monotonic counter; the candidate is
//! the key with the highest stamp, found through a `MinHeap` keyed by
//! `Reverse(counter)`.

use std::cmp::Reverse;
use std::time::Duration;

use crate::ds::MinHeap;
use crate::traits::{CacheKey, EvictionStrategy};

/// Evicts the most recently touched key.
///
/// # Example
///
/// ```
/// use cacheplex::policy::MruStrategy;
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut mru = MruStrategy::new();
/// mru.record_add(&"a", None);
/// mru.record_add(&"b", None);
/// mru.record_access(&"a");
/// assert_eq!(mru.eviction_key(), Some("a"));
/// ```
#[derive(Debug)]
pub struct MruStrategy<K> {
    stamps: MinHeap<K, Reverse<u64>>,
    counter: u64,
}

impl<K: CacheKey> MruStrategy<K> {
    pub fn new() -> Self {
        Self {
            stamps: MinHeap::new(),
            counter: 0,
        }
    }

    /// Counter value of the last touch of `key`.
    pub fn stamp(&self, key: &K) -> Option<u64> {
        self.stamps.priority_of(key).map(|Reverse(stamp)| stamp)
    }

    fn touch(&mut self, key: &K) {
        self.counter += 1;
        self.stamps.insert(Reverse(self.counter), key.clone());
    }
}

impl<K: CacheKey> Default for MruStrategy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey> EvictionStrategy<K> for MruStrategy<K> {
    fn name(&self) -> &str {
        "MRU"
    }

    fn record_add(&mut self, key: &K, _ttl: Option<Duration>) {
        self.touch(key);
    }

    fn record_access(&mut self, key: &K) {
        self.touch(key);
    }

    fn eviction_key(&self) -> Option<K> {
        self.stamps.peek().map(|(_, key)| key.clone())
    }

    fn remove_key(&mut self, key: &K) {
        self.stamps.remove(key);
    }

    fn clear(&mut self) {
        self.stamps.clear();
        self.counter = 0;
    }

    fn len(&self) -> usize {
        self.stamps.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.stamps.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_add_is_candidate() {
        let mut mru = MruStrategy::new();
        for k in 1..=3u32 {
            mru.record_add(&k, None);
        }
        assert_eq!(mru.eviction_key(), Some(3));
    }

    #[test]
    fn access_makes_key_candidate() {
        let mut mru = MruStrategy::new();
        for k in 1..=3u32 {
            mru.record_add(&k, None);
        }
        mru.record_access(&1);
        assert_eq!(mru.eviction_key(), Some(1));
        assert!(mru.stamp(&1) > mru.stamp(&3));
    }

    #[test]
    fn removing_candidate_falls_back_to_previous() {
        let mut mru = MruStrategy::new();
        mru.record_add(&"a", None);
        mru.record_add(&"b", None);
        mru.remove_key(&"b");
        assert_eq!(mru.eviction_key(), Some("a"));
        mru.remove_key(&"b");
        assert_eq!(mru.len(), 1);
    }
}
