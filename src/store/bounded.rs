//! Bounded in-memory cache engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                           BoundedCache<K>                                │
//! │                                                                          │
//! │   entries: FxHashMap<K, CacheEntry>        total_bytes: u64 (running)    │
//! │   ┌───────┬───────────────────────────────────────────────┐              │
//! │   │  key  │ value, size_bytes, expires_at, inserted_at,   │              │
//! │   │       │ last_accessed_at                              │              │
//! │   └───────┴───────────────────────────────────────────────┘              │
//! │                                                                          │
//! │   strategy: Strategy<K>          expirations: MinHeap<K, Timestamp>      │
//! │   (which key to evict)           (keys with a TTL, soonest first)        │
//! │                                                                          │
//! │   limits: max_items / max_bytes  (None disables a limit)                 │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Put Flow
//!
//! ```text
//!   put(key, value, ttl):
//!     size = weigh(key, value)
//!     size > max_bytes or max_items == 0  →  CapacityRejected (nothing evicted)
//!
//!     projected = usage with key's old size swapped for the new one
//!     while projected over a limit:
//!         first pass: purge expired entries
//!         victim = strategy.eviction_key()
//!           None → CapacityRejected
//!           Some → remove victim (if victim == key, the put becomes a fresh insert)
//!
//!     existing key → replace value, record_access + record_ttl
//!     new key      → insert, record_add
//! ```
//!
//! Size accounting is incremental: the old size is subtracted and the new one
//! added, never recomputed by summing entries.
//!
//! ## Expiry
//!
//! Expiry is lazy. An entry past its `expires_at` stays stored until a `get`
//! finds it (a miss, and the entry is dropped), a
//! [`purge_expired`](BoundedCache::purge_expired) sweep, or a `put` that
//! needs room.
//!
//! ## Strategy Swaps
//!
//! [`set_strategy`](BoundedCache::set_strategy) installs a fresh strategy and
//! does not replay history into it. Pre-existing keys become known to the new
//! strategy only as they are accessed or rewritten; until then they are not
//! eviction candidates.
//!
//! ## Thread Safety
//!
//! Not thread-safe. A multi-threaded host guards the whole engine with one
//! lock (see [`MemoryBackend`](crate::store::MemoryBackend)); per-field locking
//! would let `put` interleave and break the capacity invariant.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clock::{expiry_after, system_clock, Clock, Timestamp};
use crate::ds::MinHeap;
use crate::error::{CacheError, InvariantError};
use crate::policy::{Strategy, StrategyContext, StrategyRegistry};
use crate::store::traits::CacheMetrics;
use crate::traits::{CacheKey, EvictionStrategy};

/// Computes the accounted size of an entry.
pub type Weigher<K> = Arc<dyn Fn(&K, &[u8]) -> u64 + Send + Sync>;

/// Item-count and byte-size limits. `None` disables a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub max_items: Option<u64>,
    pub max_bytes: Option<u64>,
}

impl Limits {
    /// No limits at all.
    pub const UNBOUNDED: Limits = Limits {
        max_items: None,
        max_bytes: None,
    };

    /// Limit on item count only.
    pub fn items(max_items: u64) -> Self {
        Self {
            max_items: Some(max_items),
            max_bytes: None,
        }
    }

    /// Limit on total bytes only.
    pub fn bytes(max_bytes: u64) -> Self {
        Self {
            max_items: None,
            max_bytes: Some(max_bytes),
        }
    }

    fn exceeded_by(&self, items: u64, bytes: u64) -> bool {
        self.max_items.is_some_and(|max| items > max)
            || self.max_bytes.is_some_and(|max| bytes > max)
    }
}

/// A stored value and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    value: Vec<u8>,
    size_bytes: u64,
    expires_at: Option<Timestamp>,
    inserted_at: Timestamp,
    last_accessed_at: Timestamp,
}

impl CacheEntry {
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    pub fn inserted_at(&self) -> Timestamp {
        self.inserted_at
    }

    pub fn last_accessed_at(&self) -> Timestamp {
        self.last_accessed_at
    }

    /// Returns `true` once `now` has reached the expiry.
    #[inline]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    hits: u64,
    misses: u64,
    inserts: u64,
    updates: u64,
    removes: u64,
    evictions: u64,
    expirations: u64,
    rejections: u64,
}

/// Cache with hard item/byte limits and a pluggable eviction strategy.
///
/// # Example
///
/// ```
/// use cacheplex::policy::LruStrategy;
/// use cacheplex::policy::Strategy;
/// use cacheplex::store::{BoundedCache, Limits};
///
/// let mut cache = BoundedCache::new(Limits::items(2), Strategy::Lru(LruStrategy::new()));
/// cache.put("a", b"1".to_vec(), None).unwrap();
/// cache.put("b", b"2".to_vec(), None).unwrap();
/// cache.get(&"a");
/// cache.put("c", b"3".to_vec(), None).unwrap();
///
/// assert!(cache.contains(&"a"));
/// assert!(!cache.contains(&"b"));
/// assert_eq!(cache.len(), 2);
/// ```
pub struct BoundedCache<K> {
    entries: FxHashMap<K, CacheEntry>,
    strategy: Strategy<K>,
    limits: Limits,
    total_bytes: u64,
    expirations: MinHeap<K, Timestamp>,
    clock: Arc<dyn Clock>,
    weigher: Option<Weigher<K>>,
    seed: u64,
    counters: Counters,
}

impl<K: CacheKey> BoundedCache<K> {
    /// Creates an engine on the system clock.
    pub fn new(limits: Limits, strategy: Strategy<K>) -> Self {
        Self::with_clock(limits, strategy, system_clock())
    }

    /// Creates an engine reading time from `clock`.
    pub fn with_clock(limits: Limits, strategy: Strategy<K>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: FxHashMap::default(),
            strategy,
            limits,
            total_bytes: 0,
            expirations: MinHeap::new(),
            clock,
            weigher: None,
            seed: 0,
            counters: Counters::default(),
        }
    }

    pub(crate) fn set_weigher(&mut self, weigher: Weigher<K>) {
        self.weigher = Some(weigher);
    }

    pub(crate) fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Configured limits.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Running total of accounted entry sizes.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Name of the active strategy.
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// The active strategy.
    pub fn strategy(&self) -> &Strategy<K> {
        &self.strategy
    }

    /// The engine's time source.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns `true` if `key` is stored and not expired. No bookkeeping.
    pub fn contains(&self, key: &K) -> bool {
        let now = self.clock.now_millis();
        self.entries.get(key).is_some_and(|entry| !entry.is_expired(now))
    }

    /// Reads a live value without touching strategy state or counters.
    pub fn peek(&self, key: &K) -> Option<&[u8]> {
        self.peek_entry(key).map(CacheEntry::value)
    }

    /// Reads a live entry with its bookkeeping, without touching strategy state.
    pub fn peek_entry(&self, key: &K) -> Option<&CacheEntry> {
        let now = self.clock.now_millis();
        self.entries.get(key).filter(|entry| !entry.is_expired(now))
    }

    /// Stores `value` under `key`, evicting as needed to stay within limits.
    ///
    /// Returns the previous value when `key` was already stored.
    ///
    /// # Errors
    ///
    /// [`CacheError::CapacityRejected`] if the entry cannot fit: it alone
    /// exceeds `max_bytes`, `max_items` is zero, or the strategy runs out of
    /// candidates before enough room is made. Entries evicted before the
    /// strategy ran dry stay evicted.
    pub fn put(
        &mut self,
        key: K,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let size = self.weigh(&key, &value);
        if self.limits.max_items == Some(0) || self.limits.max_bytes.is_some_and(|max| size > max) {
            return Err(self.reject(&key, size));
        }

        let now = self.clock.now_millis();
        self.make_room(&key, size, now)?;

        let expires_at = ttl.map(|ttl| expiry_after(now, ttl));
        let previous = match self.entries.get_mut(&key) {
            Some(entry) => {
                self.total_bytes = self.total_bytes - entry.size_bytes + size;
                entry.size_bytes = size;
                entry.expires_at = expires_at;
                entry.last_accessed_at = now;
                let previous = std::mem::replace(&mut entry.value, value);
                self.strategy.record_access(&key);
                self.strategy.record_ttl(&key, ttl);
                self.counters.updates += 1;
                Some(previous)
            },
            None => {
                self.entries.insert(
                    key.clone(),
                    CacheEntry {
                        value,
                        size_bytes: size,
                        expires_at,
                        inserted_at: now,
                        last_accessed_at: now,
                    },
                );
                self.total_bytes += size;
                self.strategy.record_add(&key, ttl);
                self.counters.inserts += 1;
                None
            },
        };

        match expires_at {
            Some(at) => self.expirations.insert(at, key),
            None => {
                self.expirations.remove(&key);
            },
        }

        debug_assert!(!self.limits.exceeded_by(self.entries.len() as u64, self.total_bytes));
        Ok(previous)
    }

    /// Looks up `key`, recording the access with the strategy.
    ///
    /// An expired entry is a miss: it is dropped and `None` is returned.
    pub fn get(&mut self, key: &K) -> Option<&[u8]> {
        let now = self.clock.now_millis();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.counters.misses += 1;
                return None;
            },
        };
        if expired {
            self.detach(key);
            self.counters.expirations += 1;
            self.counters.misses += 1;
            trace!(?key, "expired on read");
            return None;
        }

        self.strategy.record_access(key);
        self.counters.hits += 1;
        let entry = self.entries.get_mut(key)?;
        entry.last_accessed_at = now;
        Some(&entry.value)
    }

    /// Removes `key`, returning its stored value (expired or not).
    ///
    /// Removing a missing key is a no-op.
    pub fn remove(&mut self, key: &K) -> Option<Vec<u8>> {
        let entry = self.detach(key)?;
        self.counters.removes += 1;
        Some(entry.value)
    }

    /// Removes every entry and resets strategy state and size accounting.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.strategy.clear();
        self.expirations.clear();
        self.total_bytes = 0;
        debug!(dropped, "cache cleared");
    }

    /// Keys of live (non-expired) entries, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        let now = self.clock.now_millis();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Iterates every stored entry, including expired ones.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &CacheEntry)> {
        self.entries.iter()
    }

    /// Drops every expired entry; returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_millis();
        let purged = self.purge_expired_at(now);
        if purged > 0 {
            debug!(purged, remaining = self.entries.len(), "purged expired entries");
        }
        purged
    }

    /// Installs a new strategy, returning the old one.
    ///
    /// History does not carry over: existing keys are unknown to the new
    /// strategy until they are next read or written.
    pub fn set_strategy(&mut self, strategy: Strategy<K>) -> Strategy<K> {
        debug!(
            from = self.strategy.name(),
            to = strategy.name(),
            entries = self.entries.len(),
            "eviction strategy swapped"
        );
        std::mem::replace(&mut self.strategy, strategy)
    }

    /// Installs the strategy registered under `name`.
    ///
    /// # Errors
    ///
    /// [`CacheError::StrategyNotFound`] if `name` is not registered; the
    /// current strategy stays in place.
    pub fn set_strategy_by_name(
        &mut self,
        registry: &StrategyRegistry<K>,
        name: &str,
    ) -> Result<(), CacheError> {
        let ctx = StrategyContext::new(Arc::clone(&self.clock), self.seed);
        let strategy = registry.create(name, &ctx)?;
        self.set_strategy(strategy);
        Ok(())
    }

    /// Snapshot of the engine counters.
    pub fn metrics(&self) -> CacheMetrics {
        let c = self.counters;
        CacheMetrics {
            hits: c.hits,
            misses: c.misses,
            inserts: c.inserts,
            updates: c.updates,
            removes: c.removes,
            evictions: c.evictions,
            expirations: c.expirations,
            rejections: c.rejections,
            entries: self.entries.len() as u64,
            total_bytes: self.total_bytes,
        }
    }

    /// Verifies size accounting, limits, expiry bookkeeping and that the
    /// strategy tracks no key the engine does not store.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let summed: u64 = self.entries.values().map(|entry| entry.size_bytes).sum();
        if summed != self.total_bytes {
            return Err(InvariantError::new(format!(
                "running total {} differs from summed sizes {summed}",
                self.total_bytes
            )));
        }
        if self.limits.exceeded_by(self.entries.len() as u64, self.total_bytes) {
            return Err(InvariantError::new(format!(
                "{} entries / {} bytes exceed {:?}",
                self.entries.len(),
                self.total_bytes,
                self.limits
            )));
        }
        for (key, entry) in &self.entries {
            if self.expirations.priority_of(key) != entry.expires_at {
                return Err(InvariantError::new(format!(
                    "expiry schedule out of sync for {key:?}"
                )));
            }
        }
        let with_expiry = self.entries.values().filter(|entry| entry.expires_at.is_some()).count();
        if self.expirations.len() != with_expiry {
            return Err(InvariantError::new("expiry schedule holds removed keys"));
        }
        if self.strategy.len() > self.entries.len() {
            return Err(InvariantError::new(format!(
                "strategy tracks {} keys for {} entries",
                self.strategy.len(),
                self.entries.len()
            )));
        }
        self.expirations.check_invariants()
    }

    fn weigh(&self, key: &K, value: &[u8]) -> u64 {
        match &self.weigher {
            Some(weigher) => weigher(key, value),
            None => value.len() as u64,
        }
    }

    fn over_limits_with(&self, key: &K, size: u64) -> bool {
        let (old_size, items) = match self.entries.get(key) {
            Some(entry) => (entry.size_bytes, self.entries.len() as u64),
            None => (0, self.entries.len() as u64 + 1),
        };
        let bytes = self.total_bytes - old_size + size;
        self.limits.exceeded_by(items, bytes)
    }

    fn make_room(&mut self, key: &K, size: u64, now: Timestamp) -> Result<(), CacheError> {
        if !self.over_limits_with(key, size) {
            return Ok(());
        }
        self.purge_expired_at(now);

        // A strategy that keeps naming keys it was told to drop would spin
        // forever; bound the loop by what can possibly be evicted.
        let mut budget = self.entries.len() + self.strategy.len() + 1;
        while self.over_limits_with(key, size) {
            let victim = match self.strategy.eviction_key() {
                Some(victim) if budget > 0 => victim,
                _ => return Err(self.reject(key, size)),
            };
            budget -= 1;
            match self.detach(&victim) {
                Some(entry) => {
                    self.counters.evictions += 1;
                    trace!(key = ?victim, size = entry.size_bytes, "evicted");
                },
                None => self.strategy.remove_key(&victim),
            }
        }
        Ok(())
    }

    fn purge_expired_at(&mut self, now: Timestamp) -> usize {
        let mut purged = 0;
        while let Some((_, key)) = self.expirations.pop_if_at_most(now) {
            if let Some(entry) = self.entries.remove(&key) {
                self.total_bytes -= entry.size_bytes;
                self.strategy.remove_key(&key);
                self.counters.expirations += 1;
                purged += 1;
            }
        }
        purged
    }

    fn detach(&mut self, key: &K) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.total_bytes -= entry.size_bytes;
        self.strategy.remove_key(key);
        self.expirations.remove(key);
        Some(entry)
    }

    fn reject(&mut self, key: &K, size: u64) -> CacheError {
        self.counters.rejections += 1;
        debug!(
            ?key,
            size,
            max_bytes = ?self.limits.max_bytes,
            max_items = ?self.limits.max_items,
            "put rejected"
        );
        CacheError::CapacityRejected {
            size_bytes: size,
            max_bytes: self.limits.max_bytes,
            max_items: self.limits.max_items,
        }
    }
}

impl<K: CacheKey> fmt::Debug for BoundedCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.entries.len())
            .field("total_bytes", &self.total_bytes)
            .field("limits", &self.limits)
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}
