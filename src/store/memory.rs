//! In-process storage backend.
//!
//! ## Architecture
//! - Wraps a [`BoundedCache<String>`] behind a single `parking_lot::Mutex`.
//! - Values pass through an optional [`Codec`] on the way in and out; sizes
//!   are accounted on the encoded bytes.
//! - Capacity rejections surface as [`AdapterError::QuotaExceeded`], the same
//!   error a browser-style backend reports when it runs out of space.
//!
//! ## Thread Safety
//! - `MemoryBackend` is `Send + Sync`. Every call takes the engine lock once,
//!   so a `put` and its evictions are atomic with respect to other callers.
//!
//! ## Example Usage
//! ```rust
//! use std::time::Duration;
//!
//! use cacheplex::builder::CacheBuilder;
//! use cacheplex::store::{MemoryBackend, StorageBackend};
//!
//! let engine = CacheBuilder::<String>::new().max_items(100).build().unwrap();
//! let backend = MemoryBackend::new("session", engine);
//!
//! backend.put("user:1", b"alice", Some(Duration::from_secs(60))).unwrap();
//! assert_eq!(backend.get("user:1").unwrap(), Some(b"alice".to_vec()));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{AdapterError, CacheError};
use crate::selector::BackendClass;
use crate::store::bounded::BoundedCache;
use crate::store::traits::{CacheMetrics, StorageBackend, StorageUsage};
use crate::traits::Codec;

/// Storage backend over a bounded in-memory engine.
pub struct MemoryBackend {
    name: String,
    engine: Mutex<BoundedCache<String>>,
    codec: Option<Arc<dyn Codec>>,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>, engine: BoundedCache<String>) -> Self {
        Self {
            name: name.into(),
            engine: Mutex::new(engine),
            codec: None,
        }
    }

    /// Encodes values with `codec` before they reach the engine.
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut BoundedCache<String>) -> R) -> R {
        f(&mut self.engine.lock())
    }

    /// Engine counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.engine.lock().metrics()
    }

    fn map_error(&self, key: &str, err: CacheError) -> AdapterError {
        match err {
            CacheError::CapacityRejected { .. } => {
                warn!(backend = %self.name, key, "memory backend quota exceeded");
                AdapterError::QuotaExceeded {
                    backend: self.name.clone(),
                    key: key.to_string(),
                }
            },
            CacheError::Adapter(inner) => inner,
            other => AdapterError::Other(Box::new(other)),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> BackendClass {
        BackendClass::FastVolatile
    }

    fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), AdapterError> {
        let stored = match &self.codec {
            Some(codec) => codec.compress(value),
            None => value.to_vec(),
        };
        self.engine
            .lock()
            .put(key.to_string(), stored, ttl)
            .map(|_| ())
            .map_err(|err| self.map_error(key, err))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AdapterError> {
        let stored = self.engine.lock().get(&key.to_string()).map(<[u8]>::to_vec);
        match (stored, &self.codec) {
            (Some(bytes), Some(codec)) => codec.decompress(&bytes).map(Some),
            (stored, _) => Ok(stored),
        }
    }

    fn remove(&self, key: &str) -> Result<(), AdapterError> {
        self.engine.lock().remove(&key.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AdapterError> {
        self.engine.lock().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, AdapterError> {
        Ok(self.engine.lock().keys())
    }

    fn usage(&self) -> Option<StorageUsage> {
        let engine = self.engine.lock();
        let used_bytes = engine.total_bytes();
        Some(StorageUsage {
            used_bytes,
            available_bytes: engine
                .limits()
                .max_bytes
                .map(|max| max.saturating_sub(used_bytes)),
        })
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("name", &self.name)
            .field("engine", &*self.engine.lock())
            .field("codec", &self.codec)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::{LruStrategy, Strategy};
    use crate::store::bounded::Limits;

    /// Reverses bytes and prefixes a marker so decoding can fail.
    #[derive(Debug)]
    struct Reverse;

    impl Codec for Reverse {
        fn compress(&self, bytes: &[u8]) -> Vec<u8> {
            let mut out = vec![b'#'];
            out.extend(bytes.iter().rev());
            out
        }

        fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, AdapterError> {
            match bytes.split_first() {
                Some((b'#', rest)) => Ok(rest.iter().rev().copied().collect()),
                _ => Err(AdapterError::Codec("missing marker".into())),
            }
        }
    }

    fn backend(limits: Limits) -> MemoryBackend {
        let engine = BoundedCache::with_clock(
            limits,
            Strategy::Lru(LruStrategy::new()),
            ManualClock::shared(0),
        );
        MemoryBackend::new("mem", engine)
    }

    #[test]
    fn put_get_remove_roundtrip() {
        let b = backend(Limits::UNBOUNDED);
        assert_eq!(b.name(), "mem");
        assert_eq!(b.class(), BackendClass::FastVolatile);
        b.put("k", b"v", None).unwrap();
        assert_eq!(b.get("k").unwrap(), Some(b"v".to_vec()));
        b.remove("k").unwrap();
        b.remove("k").unwrap();
        assert_eq!(b.get("k").unwrap(), None);
    }

    #[test]
    fn capacity_rejection_is_quota_exceeded() {
        let b = backend(Limits::bytes(4));
        let err = b.put("big", b"too large", None).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::QuotaExceeded { ref backend, ref key } if backend == "mem" && key == "big"
        ));
        assert_eq!(b.metrics().rejections, 1);
    }

    #[test]
    fn codec_applies_to_stored_bytes() {
        let b = backend(Limits::UNBOUNDED).with_codec(Arc::new(Reverse));
        b.put("k", b"abc", None).unwrap();
        assert_eq!(b.get("k").unwrap(), Some(b"abc".to_vec()));
        b.with_engine(|engine| {
            assert_eq!(engine.peek(&"k".to_string()), Some(&b"#cba"[..]));
            assert_eq!(engine.total_bytes(), 4);
        });
    }

    #[test]
    fn codec_failure_is_reported() {
        let b = backend(Limits::UNBOUNDED).with_codec(Arc::new(Reverse));
        b.with_engine(|engine| engine.put("raw".to_string(), b"xyz".to_vec(), None))
            .unwrap();
        assert!(matches!(b.get("raw"), Err(AdapterError::Codec(_))));
    }

    #[test]
    fn usage_reports_remaining_quota() {
        let b = backend(Limits::bytes(10));
        b.put("a", b"1234", None).unwrap();
        assert_eq!(
            b.usage(),
            Some(StorageUsage {
                used_bytes: 4,
                available_bytes: Some(6),
            })
        );
        b.clear().unwrap();
        assert!(b.keys().unwrap().is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let b = Arc::new(backend(Limits::items(64)));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let b = Arc::clone(&b);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        b.put(&format!("{t}:{i}"), b"x", None).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(b.keys().unwrap().len(), 64);
        b.with_engine(|engine| engine.check_invariants()).unwrap();
    }
}
