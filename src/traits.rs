//! # Core Traits
//!
//! The seams between the bounded engine and the pieces it delegates to.
//!
//! ```text
//!   ┌──────────────────────────────┐        ┌──────────────────────────────┐
//!   │       BoundedCache<K>        │        │     EvictionStrategy<K>      │
//!   │                              │───────►│                              │
//!   │  entries: key → CacheEntry   │        │  record_add(&K, ttl)         │
//!   │  total_bytes (running sum)   │        │  record_access(&K)           │
//!   │  limits: items / bytes       │        │  record_ttl(&K, ttl)         │
//!   │                              │        │  eviction_key() → Option<K>  │
//!   │  put / get / remove / clear  │        │  remove_key(&K)              │
//!   └──────────────────────────────┘        │  clear()                     │
//!                                           └──────────────────────────────┘
//! ```
//!
//! The engine owns the values and the size accounting; a strategy only ever
//! sees keys. Seven strategies ship in [`crate::policy`]; anything else can be
//! plugged in through [`Strategy::Custom`](crate::policy::Strategy::Custom)
//! and the [`StrategyRegistry`](crate::policy::StrategyRegistry).
//!
//! ## Call Protocol
//!
//! | Engine event                 | Strategy call(s)                          |
//! |------------------------------|-------------------------------------------|
//! | `put` of a new key           | `record_add(key, ttl)`                    |
//! | `put` of an existing key     | `record_access(key)`, `record_ttl(key, ttl)` |
//! | `get` hit                    | `record_access(key)`                      |
//! | `remove` / eviction / expiry | `remove_key(key)`                         |
//! | `clear`                      | `clear()`                                 |

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::error::AdapterError;

/// Bounds every cache key must satisfy.
pub trait CacheKey: Eq + Hash + Clone + Debug + Send + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Debug + Send + 'static {}

/// Policy deciding which key to evict when a bounded cache is over its limits.
///
/// All methods are infallible. [`eviction_key`](Self::eviction_key) returns
/// `None` only when nothing is tracked, and the caller treats that as
/// "nothing to evict".
///
/// # Example
///
/// ```
/// use cacheplex::policy::LruStrategy;
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut lru = LruStrategy::new();
/// lru.record_add(&"a", None);
/// lru.record_add(&"b", None);
/// lru.record_access(&"a");
/// assert_eq!(lru.eviction_key(), Some("b"));
/// ```
pub trait EvictionStrategy<K>: Send {
    /// Display name, as registered (e.g. `"LRU"`).
    fn name(&self) -> &str;

    /// Starts tracking a newly inserted key.
    fn record_add(&mut self, key: &K, ttl: Option<Duration>);

    /// Records a read hit or an in-place update.
    ///
    /// An untracked key starts being tracked, so a strategy swapped in on a
    /// live engine learns pre-existing keys as they are touched.
    fn record_access(&mut self, key: &K);

    /// Records a TTL change on an in-place update. Most strategies ignore it.
    fn record_ttl(&mut self, key: &K, ttl: Option<Duration>) {
        let _ = (key, ttl);
    }

    /// Returns the next eviction candidate without removing it.
    fn eviction_key(&self) -> Option<K>;

    /// Stops tracking `key`. Removing an untracked key is a no-op.
    fn remove_key(&mut self, key: &K);

    /// Forgets every tracked key.
    fn clear(&mut self);

    /// Number of tracked keys.
    fn len(&self) -> usize;

    /// Returns `true` if no key is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` is tracked.
    fn contains(&self, key: &K) -> bool;
}

/// Byte codec applied by a backend before storing a value.
///
/// Compression is infallible; decompression may reject corrupt input.
pub trait Codec: Send + Sync + Debug {
    /// Encodes a value for storage.
    fn compress(&self, bytes: &[u8]) -> Vec<u8>;

    /// Decodes a stored value.
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, AdapterError>;
}
