//! Backend selection by payload size, TTL and value kind.
//!
//! ## Architecture
//!
//! ```text
//!   select(size_bytes, ttl, kind)
//!        │
//!        ├── quick path ──────────────────────────────────────────────┐
//!        │     size > large threshold   → LargeStructured  (0.95)     │
//!        │     ttl  < 1 s               → FastVolatile     (0.95)     │
//!        │                                                            │
//!        ├── decision cache (FIFO, bounded) ── hit ───────────────────┤
//!        │     key = (size bucket, fits transport, ttl bucket, kind)  │
//!        │                                                            │
//!        └── full path                                                │
//!              score = 0.50·ttl + 0.30·size + 0.15·kind + 0.05·order  │
//!              overrides (transport cut, structured / volatile boost) │
//!              argmax, ties → earliest in backend_priority            │
//!              insert into decision cache ────────────────────────────┘
//! ```
//!
//! The cache key carries every feature the full path reads, so a cached
//! answer is always the answer a fresh computation would give.
//!
//! ## Thread Safety
//!
//! `BackendSelector` is `Send + Sync`; the decision cache sits behind a
//! `parking_lot::Mutex` and the hit/miss counters are atomics.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConfigError;

const TTL_WEIGHT: f64 = 0.50;
const SIZE_WEIGHT: f64 = 0.30;
const KIND_WEIGHT: f64 = 0.15;
const ORDER_WEIGHT: f64 = 0.05;

const BOOST: f64 = 0.2;
const QUICK_CONFIDENCE: f64 = 0.95;
const INSTANT_TTL: Duration = Duration::from_secs(5);
const SUB_SECOND_TTL: Duration = Duration::from_secs(1);

/// Abstract storage classes a value can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendClass {
    /// Process memory; fastest, lost on restart.
    FastVolatile,
    /// Small persistent key-value storage.
    SmallDurable,
    /// Storage scoped to a session.
    SessionDurable,
    /// Large persistent structured storage.
    LargeStructured,
    /// Tiny storage that travels with requests.
    TransportConstrained,
}

impl BackendClass {
    /// Every class, in the default priority order.
    pub const ALL: [BackendClass; 5] = [
        BackendClass::FastVolatile,
        BackendClass::SmallDurable,
        BackendClass::SessionDurable,
        BackendClass::LargeStructured,
        BackendClass::TransportConstrained,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendClass::FastVolatile => "fast-volatile",
            BackendClass::SmallDurable => "small-durable",
            BackendClass::SessionDurable => "session-durable",
            BackendClass::LargeStructured => "large-structured",
            BackendClass::TransportConstrained => "transport-constrained",
        }
    }
}

impl fmt::Display for BackendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the value being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Number,
    Boolean,
    Object,
    Array,
    Binary,
}

impl ValueKind {
    /// Objects and arrays.
    pub fn is_compound(self) -> bool {
        matches!(self, ValueKind::Object | ValueKind::Array)
    }

    fn is_primitive(self) -> bool {
        matches!(self, ValueKind::Text | ValueKind::Number | ValueKind::Boolean)
    }
}

/// Payload size thresholds in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeThresholds {
    pub small: u64,
    pub medium: u64,
    pub large: u64,
}

impl Default for SizeThresholds {
    fn default() -> Self {
        Self {
            small: 1024,
            medium: 100 * 1024,
            large: 1024 * 1024,
        }
    }
}

/// TTL thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlThresholds {
    pub short: Duration,
    pub medium: Duration,
    pub long: Duration,
}

impl Default for TtlThresholds {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(60),
            medium: Duration::from_secs(60 * 60),
            long: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Selector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub size_thresholds: SizeThresholds,
    pub ttl_thresholds: TtlThresholds,
    /// Candidate backends, most preferred first. Classes not listed are
    /// never selected.
    pub backend_priority: Vec<BackendClass>,
    /// Largest payload the transport-constrained backend accepts.
    pub transport_max_bytes: u64,
    /// Decision cache capacity; `0` disables caching.
    pub cache_capacity: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            size_thresholds: SizeThresholds::default(),
            ttl_thresholds: TtlThresholds::default(),
            backend_priority: BackendClass::ALL.to_vec(),
            transport_max_bytes: 4096,
            cache_capacity: 100,
        }
    }
}

impl SelectorConfig {
    /// Checks threshold ordering and the priority list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.size_thresholds;
        if !(s.small < s.medium && s.medium < s.large) {
            return Err(ConfigError::new(format!(
                "size_thresholds must be strictly increasing, got {}/{}/{}",
                s.small, s.medium, s.large
            )));
        }
        let t = &self.ttl_thresholds;
        if !(t.short < t.medium && t.medium < t.long) {
            return Err(ConfigError::new(format!(
                "ttl_thresholds must be strictly increasing, got {:?}/{:?}/{:?}",
                t.short, t.medium, t.long
            )));
        }
        if self.backend_priority.is_empty() {
            return Err(ConfigError::new("backend_priority must not be empty"));
        }
        for (i, class) in self.backend_priority.iter().enumerate() {
            if self.backend_priority[..i].contains(class) {
                return Err(ConfigError::new(format!(
                    "backend_priority lists {class} more than once"
                )));
            }
        }
        Ok(())
    }
}

/// A chosen backend with its justification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub backend: BackendClass,
    pub reason: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Score of every candidate that was considered, in priority order.
    pub scores: Vec<(BackendClass, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SizeBucket {
    Tiny,
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TtlBucket {
    Instant,
    Ephemeral,
    Short,
    Medium,
    Long,
    Persistent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Features {
    size: SizeBucket,
    fits_transport: bool,
    ttl: TtlBucket,
    kind: ValueKind,
}

#[derive(Debug, Default)]
struct DecisionCache {
    map: FxHashMap<Features, Selection>,
    order: VecDeque<Features>,
}

impl DecisionCache {
    fn insert(&mut self, capacity: usize, key: Features, selection: Selection) {
        if capacity == 0 || self.map.contains_key(&key) {
            return;
        }
        while self.map.len() >= capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.map.remove(&oldest);
                },
                None => break,
            }
        }
        self.order.push_back(key);
        self.map.insert(key, selection);
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

/// Scores backend classes for a payload and picks the best.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use cacheplex::selector::{BackendClass, BackendSelector, ValueKind};
///
/// let selector = BackendSelector::default();
///
/// let session = selector.select(200, Some(Duration::from_secs(30 * 60)), ValueKind::Text);
/// assert_eq!(session.backend, BackendClass::FastVolatile);
///
/// let blob = selector.select(5 * 1024 * 1024, None, ValueKind::Binary);
/// assert_eq!(blob.backend, BackendClass::LargeStructured);
/// assert!(blob.confidence > 0.9);
/// ```
#[derive(Debug)]
pub struct BackendSelector {
    config: SelectorConfig,
    cache: Mutex<DecisionCache>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl BackendSelector {
    /// Creates a selector after validating `config`.
    pub fn new(config: SelectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: Mutex::new(DecisionCache::default()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Picks a backend for a payload of `size_bytes` with the given TTL and kind.
    pub fn select(&self, size_bytes: u64, ttl: Option<Duration>, kind: ValueKind) -> Selection {
        if let Some(selection) = self.quick_path(size_bytes, ttl) {
            trace!(backend = %selection.backend, size_bytes, ?ttl, "quick path");
            return selection;
        }

        let features = self.features(size_bytes, ttl, kind);
        if let Some(cached) = self.cache.lock().map.get(&features) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let selection = self.score(features);
        trace!(
            backend = %selection.backend,
            confidence = selection.confidence,
            ?features,
            "full path"
        );
        self.cache
            .lock()
            .insert(self.config.cache_capacity, features, selection.clone());
        selection
    }

    /// Scores every candidate on the full path, best first.
    ///
    /// Ties keep priority order. The quick path and the decision cache are
    /// bypassed.
    pub fn rank(
        &self,
        size_bytes: u64,
        ttl: Option<Duration>,
        kind: ValueKind,
    ) -> Vec<(BackendClass, f64)> {
        let mut scores = self.score(self.features(size_bytes, ttl, kind)).scores;
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores
    }

    /// Decision-cache `(hits, misses)`.
    pub fn cache_stats(&self) -> (u64, u64) {
        (
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        )
    }

    /// Number of cached decisions.
    pub fn cached_decisions(&self) -> usize {
        self.cache.lock().map.len()
    }

    /// Drops every cached decision. Counters are kept.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn candidate(&self, class: BackendClass) -> bool {
        self.config.backend_priority.contains(&class)
    }

    fn quick_path(&self, size_bytes: u64, ttl: Option<Duration>) -> Option<Selection> {
        let (backend, reason) = if size_bytes > self.config.size_thresholds.large
            && self.candidate(BackendClass::LargeStructured)
        {
            (
                BackendClass::LargeStructured,
                format!("{size_bytes} byte payload exceeds the large threshold"),
            )
        } else if ttl.is_some_and(|ttl| ttl < SUB_SECOND_TTL)
            && self.candidate(BackendClass::FastVolatile)
        {
            (BackendClass::FastVolatile, "sub-second ttl".to_string())
        } else {
            return None;
        };
        Some(Selection {
            backend,
            reason,
            confidence: QUICK_CONFIDENCE,
            scores: vec![(backend, QUICK_CONFIDENCE)],
        })
    }

    fn features(&self, size_bytes: u64, ttl: Option<Duration>, kind: ValueKind) -> Features {
        let s = &self.config.size_thresholds;
        let size = if size_bytes < s.small {
            SizeBucket::Tiny
        } else if size_bytes < s.medium {
            SizeBucket::Small
        } else if size_bytes < s.large {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        };

        let t = &self.config.ttl_thresholds;
        let ttl = match ttl {
            None => TtlBucket::Persistent,
            Some(ttl) if ttl < INSTANT_TTL => TtlBucket::Instant,
            Some(ttl) if ttl < t.short => TtlBucket::Ephemeral,
            Some(ttl) if ttl < t.medium => TtlBucket::Short,
            Some(ttl) if ttl < t.long => TtlBucket::Medium,
            Some(_) => TtlBucket::Long,
        };

        Features {
            size,
            fits_transport: size_bytes <= self.config.transport_max_bytes,
            ttl,
            kind,
        }
    }

    fn score(&self, features: Features) -> Selection {
        let priority = &self.config.backend_priority;
        let n = priority.len() as f64;

        let scores: Vec<(BackendClass, f64)> = priority
            .iter()
            .enumerate()
            .map(|(idx, &class)| {
                let order = (n - idx as f64) / n;
                let mut score = TTL_WEIGHT * ttl_score(class, features.ttl)
                    + SIZE_WEIGHT * size_score(class, features.size)
                    + KIND_WEIGHT * kind_score(class, features.kind)
                    + ORDER_WEIGHT * order;
                match class {
                    BackendClass::TransportConstrained
                        if !features.fits_transport || !features.kind.is_primitive() =>
                    {
                        score = 0.0;
                    },
                    BackendClass::LargeStructured
                        if features.size == SizeBucket::Large || features.kind.is_compound() =>
                    {
                        score += BOOST;
                    },
                    BackendClass::FastVolatile if features.ttl == TtlBucket::Instant => {
                        score += BOOST;
                    },
                    _ => {},
                }
                (class, score)
            })
            .collect();

        let mut best = scores[0];
        for &(class, score) in &scores[1..] {
            if score > best.1 {
                best = (class, score);
            }
        }

        Selection {
            backend: best.0,
            reason: format!(
                "scored {:.2}: {:?} size, {:?} ttl, {:?} value",
                best.1, features.size, features.ttl, features.kind
            ),
            confidence: best.1.clamp(0.0, 1.0),
            scores,
        }
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self {
            config: SelectorConfig::default(),
            cache: Mutex::new(DecisionCache::default()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }
}

fn size_score(class: BackendClass, size: SizeBucket) -> f64 {
    use BackendClass::*;
    use SizeBucket::*;
    match (class, size) {
        (FastVolatile, Tiny | Small) => 0.9,
        (FastVolatile, Medium) => 0.7,
        (FastVolatile, Large) => 0.4,
        (SmallDurable, Tiny) => 0.9,
        (SmallDurable, Small) => 0.8,
        (SmallDurable, Medium) => 0.4,
        (SmallDurable, Large) => 0.0,
        (SessionDurable, Tiny) => 0.8,
        (SessionDurable, Small) => 0.7,
        (SessionDurable, Medium) => 0.4,
        (SessionDurable, Large) => 0.0,
        (LargeStructured, Tiny) => 0.5,
        (LargeStructured, Small) => 0.7,
        (LargeStructured, Medium) => 0.9,
        (LargeStructured, Large) => 1.0,
        (TransportConstrained, Tiny) => 0.6,
        (TransportConstrained, Small) => 0.1,
        (TransportConstrained, Medium | Large) => 0.0,
    }
}

fn ttl_score(class: BackendClass, ttl: TtlBucket) -> f64 {
    use BackendClass::*;
    use TtlBucket::*;
    match (class, ttl) {
        (FastVolatile, Instant | Ephemeral) => 1.0,
        (FastVolatile, Short) => 0.8,
        (FastVolatile, Medium) => 0.4,
        (FastVolatile, Long) => 0.1,
        (FastVolatile, Persistent) => 0.0,
        (SmallDurable, Instant | Ephemeral) => 0.2,
        (SmallDurable, Short) => 0.5,
        (SmallDurable, Medium) => 0.8,
        (SmallDurable, Long) => 0.9,
        (SmallDurable, Persistent) => 1.0,
        (SessionDurable, Instant | Ephemeral) => 0.5,
        (SessionDurable, Short) => 0.8,
        (SessionDurable, Medium) => 0.6,
        (SessionDurable, Long) => 0.2,
        (SessionDurable, Persistent) => 0.1,
        (LargeStructured, Instant | Ephemeral) => 0.1,
        (LargeStructured, Short) => 0.4,
        (LargeStructured, Medium) => 0.8,
        (LargeStructured, Long) => 0.9,
        (LargeStructured, Persistent) => 1.0,
        (TransportConstrained, Instant | Ephemeral) => 0.3,
        (TransportConstrained, Short | Medium) => 0.5,
        (TransportConstrained, Long) => 0.4,
        (TransportConstrained, Persistent) => 0.3,
    }
}

fn kind_score(class: BackendClass, kind: ValueKind) -> f64 {
    use BackendClass::*;
    match class {
        FastVolatile => 0.8,
        SmallDurable | SessionDurable => {
            let base = if kind.is_primitive() {
                0.9
            } else if kind.is_compound() {
                0.7
            } else {
                0.2
            };
            if class == SessionDurable && kind != ValueKind::Binary {
                base - 0.1
            } else {
                base
            }
        },
        LargeStructured => match kind {
            ValueKind::Text => 0.6,
            ValueKind::Number | ValueKind::Boolean => 0.5,
            ValueKind::Object | ValueKind::Array => 0.9,
            ValueKind::Binary => 1.0,
        },
        TransportConstrained => {
            if kind.is_primitive() {
                0.7
            } else if kind.is_compound() {
                0.2
            } else {
                0.0
            }
        },
    }
}
