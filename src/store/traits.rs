//! Storage backend contract and engine metrics.
//!
//! The bounded engine stays free of I/O; anything that persists bytes
//! somewhere (browser-style storage, a key-value database, a cookie jar)
//! sits behind [`StorageBackend`]. Backends use interior mutability so a
//! façade can hold several of them behind shared references.

use std::time::Duration;

use serde::Serialize;

use crate::error::AdapterError;
use crate::selector::BackendClass;

/// Quota introspection reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    /// Bytes currently stored.
    pub used_bytes: u64,
    /// Bytes still available, if the backend has a known quota.
    pub available_bytes: Option<u64>,
}

/// Operations every storage backend provides.
///
/// Errors are returned as [`AdapterError`] and forwarded unchanged by the
/// layers above; nothing in this crate retries them.
pub trait StorageBackend: Send + Sync {
    /// Backend instance name, used in logs and errors.
    fn name(&self) -> &str;

    /// The storage class this backend implements.
    fn class(&self) -> BackendClass;

    /// Stores `value` under `key`.
    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), AdapterError>;

    /// Fetches the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AdapterError>;

    /// Removes `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), AdapterError>;

    /// Removes every key.
    fn clear(&self) -> Result<(), AdapterError>;

    /// Lists stored keys.
    fn keys(&self) -> Result<Vec<String>, AdapterError>;

    /// Quota information, for backends that support it.
    fn usage(&self) -> Option<StorageUsage> {
        None
    }
}

/// Snapshot of a bounded cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub updates: u64,
    pub removes: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub rejections: u64,
    pub entries: u64,
    pub total_bytes: u64,
}

impl CacheMetrics {
    /// Hits over lookups; `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_handles_zero_lookups() {
        assert_eq!(CacheMetrics::default().hit_rate(), 0.0);
        let m = CacheMetrics {
            hits: 3,
            misses: 1,
            ..CacheMetrics::default()
        };
        assert!((m.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
