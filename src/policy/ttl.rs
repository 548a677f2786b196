//! Expiry-ordered eviction.
//!
//! Evicts the key that expires soonest. Keys already past their expiry sort
//! before every live key, so they always go first; keys without a TTL sort
//! last, oldest insertion first.
//!
//! ```text
//!   now = 2_000
//!
//!   expiries: MinHeap<K, (expires_at, seq)>
//!
//!     ("b", (1_500, 1))   ← expired, evicted first
//!     ("c", (4_000, 2))
//!     ("a", (6_000, 0))
//!     ("z", (MAX,   3))   ← no TTL
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{expiry_after, Clock, Timestamp};
use crate::ds::MinHeap;
use crate::traits::{CacheKey, EvictionStrategy};

const NO_EXPIRY: Timestamp = Timestamp::MAX;

/// Soonest-expiry-first eviction.
///
/// # Example
///
/// ```
/// use cacheplex::clock::ManualClock;
/// use cacheplex::policy::TtlStrategy;
/// use cacheplex::traits::EvictionStrategy;
/// use std::time::Duration;
///
/// let mut ttl = TtlStrategy::new(ManualClock::shared(0));
/// ttl.record_add(&"a", Some(Duration::from_secs(5)));
/// ttl.record_add(&"b", Some(Duration::from_secs(1)));
/// ttl.record_add(&"c", None);
/// assert_eq!(ttl.eviction_key(), Some("b"));
/// ```
#[derive(Debug)]
pub struct TtlStrategy<K> {
    expiries: MinHeap<K, (Timestamp, u64)>,
    seq: u64,
    clock: Arc<dyn Clock>,
}

impl<K: CacheKey> TtlStrategy<K> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            expiries: MinHeap::new(),
            seq: 0,
            clock,
        }
    }

    /// Absolute expiry of `key`; `None` if untracked or without a TTL.
    pub fn expires_at(&self, key: &K) -> Option<Timestamp> {
        self.expiries
            .priority_of(key)
            .map(|(at, _)| at)
            .filter(|&at| at != NO_EXPIRY)
    }

    /// Returns `true` if `key` is tracked and past its expiry.
    pub fn is_expired(&self, key: &K) -> bool {
        self.expires_at(key)
            .is_some_and(|at| at <= self.clock.now_millis())
    }

    fn deadline(&self, ttl: Option<Duration>) -> Timestamp {
        ttl.map_or(NO_EXPIRY, |ttl| expiry_after(self.clock.now_millis(), ttl))
    }

    fn track(&mut self, key: &K, deadline: Timestamp) {
        let seq = self.seq;
        self.seq += 1;
        self.expiries.insert((deadline, seq), key.clone());
    }
}

impl<K: CacheKey> EvictionStrategy<K> for TtlStrategy<K> {
    fn name(&self) -> &str {
        "TTL"
    }

    fn record_add(&mut self, key: &K, ttl: Option<Duration>) {
        let deadline = self.deadline(ttl);
        if self.expiries.contains(key) {
            self.record_ttl(key, ttl);
        } else {
            self.track(key, deadline);
        }
    }

    fn record_access(&mut self, key: &K) {
        if !self.expiries.contains(key) {
            self.track(key, NO_EXPIRY);
        }
    }

    fn record_ttl(&mut self, key: &K, ttl: Option<Duration>) {
        let deadline = self.deadline(ttl);
        match self.expiries.priority_of(key) {
            Some((_, seq)) => {
                self.expiries.update_priority(key, (deadline, seq));
            },
            None => self.track(key, deadline),
        }
    }

    fn eviction_key(&self) -> Option<K> {
        self.expiries.peek().map(|(_, key)| key.clone())
    }

    fn remove_key(&mut self, key: &K) {
        self.expiries.remove(key);
    }

    fn clear(&mut self) {
        self.expiries.clear();
        self.seq = 0;
    }

    fn len(&self) -> usize {
        self.expiries.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.expiries.contains(key)
    }
}
