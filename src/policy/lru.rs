//! Least Recently Used eviction.
//!
//! ## Architecture
//!
//! ```text
//!   OrderList<K>   (arena nodes linked by index, key → slot map)
//!
//!   head (MRU) ─► [D] ◄──► [A] ◄──► [C] ◄── tail (LRU, next victim)
//!
//!   record_add(K)     push K at head
//!   record_access(K)  move K to head (push if untracked)
//!   eviction_key()    tail
//!   remove_key(K)     unlink K
//! ```
//!
//! All operations are O(1). The list order always mirrors the order of the
//! most recent `record_add` / `record_access` calls.

use std::time::Duration;

use crate::ds::OrderList;
use crate::traits::{CacheKey, EvictionStrategy};

/// Recency-ordered eviction: the least recently touched key goes first.
///
/// # Example
///
/// ```
/// use cacheplex::policy::LruStrategy;
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut lru = LruStrategy::new();
/// for key in ["a", "b", "c"] {
///     lru.record_add(&key, None);
/// }
/// lru.record_access(&"a");
/// assert_eq!(lru.eviction_key(), Some("b"));
/// ```
#[derive(Debug)]
pub struct LruStrategy<K> {
    order: OrderList<K>,
}

impl<K: CacheKey> LruStrategy<K> {
    pub fn new() -> Self {
        Self {
            order: OrderList::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: OrderList::with_capacity(capacity),
        }
    }

    /// Keys from most to least recently used.
    pub fn recency_order(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// The most recently used key.
    pub fn most_recent(&self) -> Option<&K> {
        self.order.front()
    }

    fn touch(&mut self, key: &K) {
        if !self.order.move_to_front(key) {
            self.order.push_front(key.clone());
        }
    }
}

impl<K: CacheKey> Default for LruStrategy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey> EvictionStrategy<K> for LruStrategy<K> {
    fn name(&self) -> &str {
        "LRU"
    }

    fn record_add(&mut self, key: &K, _ttl: Option<Duration>) {
        self.touch(key);
    }

    fn record_access(&mut self, key: &K) {
        self.touch(key);
    }

    fn eviction_key(&self) -> Option<K> {
        self.order.back().cloned()
    }

    fn remove_key(&mut self, key: &K) {
        self.order.remove(key);
    }

    fn clear(&mut self) {
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.order.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strategy_has_no_candidate() {
        let lru: LruStrategy<u32> = LruStrategy::new();
        assert_eq!(lru.eviction_key(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn oldest_add_is_candidate() {
        let mut lru = LruStrategy::new();
        lru.record_add(&1, None);
        lru.record_add(&2, None);
        lru.record_add(&3, None);
        assert_eq!(lru.eviction_key(), Some(1));
    }

    #[test]
    fn access_moves_key_to_front() {
        let mut lru = LruStrategy::new();
        for k in ["a", "b", "c"] {
            lru.record_add(&k, None);
        }
        lru.record_access(&"a");
        let order: Vec<_> = lru.recency_order().copied().collect();
        assert_eq!(order, vec!["a", "c", "b"]);
        assert_eq!(lru.most_recent(), Some(&"a"));
        assert_eq!(lru.eviction_key(), Some("b"));
    }

    #[test]
    fn eviction_key_is_a_pure_query() {
        let mut lru = LruStrategy::new();
        lru.record_add(&"a", None);
        lru.record_add(&"b", None);
        assert_eq!(lru.eviction_key(), Some("a"));
        assert_eq!(lru.eviction_key(), Some("a"));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn access_of_untracked_key_starts_tracking() {
        let mut lru = LruStrategy::new();
        lru.record_access(&"x");
        assert!(lru.contains(&"x"));
        assert_eq!(lru.eviction_key(), Some("x"));
    }

    #[test]
    fn remove_key_is_idempotent() {
        let mut lru = LruStrategy::new();
        lru.record_add(&"a", None);
        lru.record_add(&"b", None);
        lru.remove_key(&"a");
        lru.remove_key(&"a");
        lru.remove_key(&"never");
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.eviction_key(), Some("b"));
    }

    #[test]
    fn clear_resets() {
        let mut lru = LruStrategy::new();
        lru.record_add(&"a", None);
        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.eviction_key(), None);
    }
}
