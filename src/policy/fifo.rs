//! First In, First Out eviction.
//!
//! Keys are queued in insertion order and evicted from the front. Accesses
//! never reorder the queue; an existing key only moves if it is removed and
//! added again.
//!
//! ```text
//!   front (oldest, next victim) ─► [A] ─ [B] ─ [C] ─ [D] ◄─ back (newest)
//! ```

use std::time::Duration;

use crate::ds::OrderList;
use crate::traits::{CacheKey, EvictionStrategy};

/// Insertion-ordered eviction.
///
/// # Example
///
/// ```
/// use cacheplex::policy::FifoStrategy;
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut fifo = FifoStrategy::new();
/// fifo.record_add(&"a", None);
/// fifo.record_add(&"b", None);
/// fifo.record_access(&"a");
/// assert_eq!(fifo.eviction_key(), Some("a"));
/// ```
#[derive(Debug)]
pub struct FifoStrategy<K> {
    queue: OrderList<K>,
}

impl<K: CacheKey> FifoStrategy<K> {
    pub fn new() -> Self {
        Self {
            queue: OrderList::new(),
        }
    }

    /// Keys from oldest to newest.
    pub fn insertion_order(&self) -> impl Iterator<Item = &K> {
        self.queue.iter()
    }
}

impl<K: CacheKey> Default for FifoStrategy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey> EvictionStrategy<K> for FifoStrategy<K> {
    fn name(&self) -> &str {
        "FIFO"
    }

    fn record_add(&mut self, key: &K, _ttl: Option<Duration>) {
        // Re-adding a queued key keeps its original position.
        self.queue.push_back(key.clone());
    }

    fn record_access(&mut self, key: &K) {
        if !self.queue.contains(key) {
            self.queue.push_back(key.clone());
        }
    }

    fn eviction_key(&self) -> Option<K> {
        self.queue.front().cloned()
    }

    fn remove_key(&mut self, key: &K) {
        self.queue.remove(key);
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.queue.contains(key)
    }
}
