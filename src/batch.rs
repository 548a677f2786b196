//! Batch helpers over the engine and storage backends.
//!
//! Per-key failures never abort sibling operations unless
//! [`BatchOptions::stop_on_error`] is set; every key ends up in exactly one of
//! `succeeded`, `failed` or `skipped` in the returned [`BatchReport`].
//!
//! Only I/O runs in parallel. [`load_many`] fetches values on a bounded
//! `rayon` pool and then applies them to the engine one at a time from the
//! calling thread; [`store_many`] writes straight to a backend, which is
//! `Sync` and does its own locking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;
use tracing::warn;

use crate::error::{AdapterError, CacheError, ConfigError};
use crate::store::{BoundedCache, StorageBackend};
use crate::traits::CacheKey;

/// Default worker count for parallel batches.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Batch behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of concurrent fetches or writes.
    pub concurrency: usize,
    /// Stop at the first failure; remaining keys are reported as skipped.
    pub stop_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            stop_on_error: false,
        }
    }
}

impl BatchOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::new("concurrency must be greater than zero"));
        }
        Ok(())
    }

    fn pool(&self) -> Result<ThreadPool, ConfigError> {
        self.validate()?;
        ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("cacheplex-batch-{i}"))
            .build()
            .map_err(|err| ConfigError::new(format!("batch worker pool: {err}")))
    }
}

/// Aggregate outcome of a batch.
#[derive(Debug)]
pub struct BatchReport<K, E> {
    pub succeeded: Vec<K>,
    pub failed: Vec<(K, E)>,
    /// Keys never attempted because an earlier failure stopped the batch.
    pub skipped: Vec<K>,
}

impl<K, E> BatchReport<K, E> {
    fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Returns `true` if every key succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Total number of keys in the batch.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }
}

/// Failure of one key in [`load_many`].
#[derive(Debug, Error)]
pub enum LoadError<E>
where
    E: std::error::Error + 'static,
{
    /// The fetch closure failed.
    #[error("fetch failed: {0}")]
    Fetch(#[source] E),

    /// The engine rejected the fetched value.
    #[error(transparent)]
    Store(#[from] CacheError),
}

/// Inserts every item into `cache`.
pub fn put_many<K, I>(
    cache: &mut BoundedCache<K>,
    items: I,
    options: &BatchOptions,
) -> BatchReport<K, CacheError>
where
    K: CacheKey,
    I: IntoIterator<Item = (K, Vec<u8>, Option<Duration>)>,
{
    let mut report = BatchReport::new();
    let mut items = items.into_iter();
    for (key, value, ttl) in items.by_ref() {
        match cache.put(key.clone(), value, ttl) {
            Ok(_) => report.succeeded.push(key),
            Err(err) => {
                warn!(?key, error = %err, "batch put failed");
                report.failed.push((key, err));
                if options.stop_on_error {
                    break;
                }
            },
        }
    }
    report.skipped.extend(items.map(|(key, _, _)| key));
    report
}

/// Reads every key, in order. Misses (including expired entries) are `None`.
pub fn get_many<K, I>(cache: &mut BoundedCache<K>, keys: I) -> Vec<(K, Option<Vec<u8>>)>
where
    K: CacheKey,
    I: IntoIterator<Item = K>,
{
    keys.into_iter()
        .map(|key| {
            let value = cache.get(&key).map(<[u8]>::to_vec);
            (key, value)
        })
        .collect()
}

/// Removes every key; returns how many were present.
pub fn remove_many<'a, K, I>(cache: &mut BoundedCache<K>, keys: I) -> usize
where
    K: CacheKey,
    I: IntoIterator<Item = &'a K>,
{
    keys.into_iter().filter(|key| cache.remove(key).is_some()).count()
}

/// Fetches values for `keys` in parallel and inserts them into `cache`.
///
/// At most `options.concurrency` fetches run at once. Inserts happen on the
/// calling thread after all fetches complete, in key order.
///
/// # Errors
///
/// [`ConfigError`] if `options` is invalid. Per-key failures are reported in
/// the [`BatchReport`].
pub fn load_many<K, E, F>(
    cache: &mut BoundedCache<K>,
    keys: Vec<K>,
    ttl: Option<Duration>,
    options: &BatchOptions,
    fetch: F,
) -> Result<BatchReport<K, LoadError<E>>, ConfigError>
where
    K: CacheKey + Sync,
    E: std::error::Error + Send + 'static,
    F: Fn(&K) -> Result<Vec<u8>, E> + Sync,
{
    let pool = options.pool()?;
    let stop = AtomicBool::new(false);
    let fetched: Vec<Option<Result<Vec<u8>, E>>> = pool.install(|| {
        keys.par_iter()
            .map(|key| {
                if stop.load(Ordering::Relaxed) {
                    return None;
                }
                let result = fetch(key);
                if result.is_err() && options.stop_on_error {
                    stop.store(true, Ordering::Relaxed);
                }
                Some(result)
            })
            .collect()
    });

    let mut report = BatchReport::new();
    let mut stopped = false;
    for (key, outcome) in keys.into_iter().zip(fetched) {
        if stopped {
            report.skipped.push(key);
            continue;
        }
        let result = match outcome {
            None => {
                report.skipped.push(key);
                continue;
            },
            Some(Err(err)) => Err(LoadError::Fetch(err)),
            Some(Ok(value)) => cache
                .put(key.clone(), value, ttl)
                .map(drop)
                .map_err(LoadError::Store),
        };
        match result {
            Ok(()) => report.succeeded.push(key),
            Err(err) => {
                warn!(?key, error = %err, "batch load failed");
                report.failed.push((key, err));
                stopped = options.stop_on_error;
            },
        }
    }
    Ok(report)
}

/// Writes every item to `backend` in parallel.
///
/// # Errors
///
/// [`ConfigError`] if `options` is invalid. Per-key failures are reported in
/// the [`BatchReport`].
pub fn store_many(
    backend: &dyn StorageBackend,
    items: &[(String, Vec<u8>)],
    ttl: Option<Duration>,
    options: &BatchOptions,
) -> Result<BatchReport<String, AdapterError>, ConfigError> {
    let pool = options.pool()?;
    let stop = AtomicBool::new(false);
    let outcomes: Vec<Option<Result<(), AdapterError>>> = pool.install(|| {
        items
            .par_iter()
            .map(|(key, value)| {
                if stop.load(Ordering::Relaxed) {
                    return None;
                }
                let result = backend.put(key, value, ttl);
                if result.is_err() && options.stop_on_error {
                    stop.store(true, Ordering::Relaxed);
                }
                Some(result)
            })
            .collect()
    });

    let mut report = BatchReport::new();
    for ((key, _), outcome) in items.iter().zip(outcomes) {
        match outcome {
            Some(Ok(())) => report.succeeded.push(key.clone()),
            Some(Err(err)) => {
                warn!(backend = backend.name(), key = %key, error = %err, "batch store failed");
                report.failed.push((key.clone(), err));
            },
            None => report.skipped.push(key.clone()),
        }
    }
    Ok(report)
}
