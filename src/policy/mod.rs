//! Eviction strategies.
//!
//! | Strategy   | Candidate                                   | Bookkeeping              |
//! |------------|---------------------------------------------|--------------------------|
//! | `LRU`      | least recently added/accessed               | arena linked list        |
//! | `LFU`      | lowest frequency, oldest access on ties     | min-heap (freq, tick)    |
//! | `FIFO`     | oldest insertion                            | arena linked list        |
//! | `MRU`      | most recently added/accessed                | min-heap Reverse(stamp)  |
//! | `Random`   | uniform sample                              | dense key vector         |
//! | `TTL`      | soonest expiry (expired first)              | min-heap (expiry, seq)   |
//! | `Adaptive` | weighted pick between LRU and LFU           | both of the above        |
//!
//! [`Strategy`] is the closed set of built-ins plus a `Custom` trait-object
//! slot; the engine dispatches through it. [`StrategyRegistry`] maps names to
//! factories producing a `Strategy`.

pub mod adaptive;
pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod mru;
pub mod random;
pub mod registry;
pub mod ttl;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{system_clock, Clock};
use crate::error::CacheError;
use crate::traits::{CacheKey, EvictionStrategy};

pub use adaptive::AdaptiveStrategy;
pub use fifo::FifoStrategy;
pub use lfu::LfuStrategy;
pub use lru::LruStrategy;
pub use mru::MruStrategy;
pub use random::RandomStrategy;
pub use registry::{StrategyFactory, StrategyRegistry};
pub use ttl::TtlStrategy;

/// Environment handed to strategy factories.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    /// Time source for expiry-aware strategies.
    pub clock: Arc<dyn Clock>,
    /// Seed for randomised strategies.
    pub seed: u64,
}

impl StrategyContext {
    pub fn new(clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self { clock, seed }
    }
}

impl Default for StrategyContext {
    fn default() -> Self {
        let clock = system_clock();
        let seed = clock.now_millis();
        Self { clock, seed }
    }
}

/// The built-in strategy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Lru,
    Lfu,
    Fifo,
    Mru,
    Random,
    Ttl,
    Adaptive,
}

impl StrategyKind {
    /// Every built-in, in registration order.
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::Lru,
        StrategyKind::Lfu,
        StrategyKind::Fifo,
        StrategyKind::Mru,
        StrategyKind::Random,
        StrategyKind::Ttl,
        StrategyKind::Adaptive,
    ];

    /// Canonical registry name.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Lru => "LRU",
            StrategyKind::Lfu => "LFU",
            StrategyKind::Fifo => "FIFO",
            StrategyKind::Mru => "MRU",
            StrategyKind::Random => "Random",
            StrategyKind::Ttl => "TTL",
            StrategyKind::Adaptive => "Adaptive",
        }
    }

    /// Builds a fresh strategy of this kind.
    pub fn build<K: CacheKey>(self, ctx: &StrategyContext) -> Strategy<K> {
        match self {
            StrategyKind::Lru => Strategy::Lru(LruStrategy::new()),
            StrategyKind::Lfu => Strategy::Lfu(LfuStrategy::new()),
            StrategyKind::Fifo => Strategy::Fifo(FifoStrategy::new()),
            StrategyKind::Mru => Strategy::Mru(MruStrategy::new()),
            StrategyKind::Random => Strategy::Random(RandomStrategy::with_seed(ctx.seed)),
            StrategyKind::Ttl => Strategy::Ttl(TtlStrategy::new(Arc::clone(&ctx.clock))),
            StrategyKind::Adaptive => Strategy::Adaptive(AdaptiveStrategy::with_seed(ctx.seed)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CacheError::StrategyNotFound(s.to_string()))
    }
}

/// A concrete eviction strategy: one of the built-ins or a custom one.
pub enum Strategy<K> {
    Lru(LruStrategy<K>),
    Lfu(LfuStrategy<K>),
    Fifo(FifoStrategy<K>),
    Mru(MruStrategy<K>),
    Random(RandomStrategy<K>),
    Ttl(TtlStrategy<K>),
    Adaptive(AdaptiveStrategy<K>),
    Custom(Box<dyn EvictionStrategy<K>>),
}

impl<K: CacheKey> Strategy<K> {
    /// Wraps a user-defined strategy.
    pub fn custom(strategy: impl EvictionStrategy<K> + 'static) -> Self {
        Strategy::Custom(Box::new(strategy))
    }

    /// The built-in kind, or `None` for custom strategies.
    pub fn kind(&self) -> Option<StrategyKind> {
        match self {
            Strategy::Lru(_) => Some(StrategyKind::Lru),
            Strategy::Lfu(_) => Some(StrategyKind::Lfu),
            Strategy::Fifo(_) => Some(StrategyKind::Fifo),
            Strategy::Mru(_) => Some(StrategyKind::Mru),
            Strategy::Random(_) => Some(StrategyKind::Random),
            Strategy::Ttl(_) => Some(StrategyKind::Ttl),
            Strategy::Adaptive(_) => Some(StrategyKind::Adaptive),
            Strategy::Custom(_) => None,
        }
    }

    fn inner(&self) -> &dyn EvictionStrategy<K> {
        match self {
            Strategy::Lru(s) => s,
            Strategy::Lfu(s) => s,
            Strategy::Fifo(s) => s,
            Strategy::Mru(s) => s,
            Strategy::Random(s) => s,
            Strategy::Ttl(s) => s,
            Strategy::Adaptive(s) => s,
            Strategy::Custom(s) => s.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn EvictionStrategy<K> {
        match self {
            Strategy::Lru(s) => s,
            Strategy::Lfu(s) => s,
            Strategy::Fifo(s) => s,
            Strategy::Mru(s) => s,
            Strategy::Random(s) => s,
            Strategy::Ttl(s) => s,
            Strategy::Adaptive(s) => s,
            Strategy::Custom(s) => s.as_mut(),
        }
    }
}

impl<K: CacheKey> EvictionStrategy<K> for Strategy<K> {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn record_add(&mut self, key: &K, ttl: Option<Duration>) {
        self.inner_mut().record_add(key, ttl);
    }

    fn record_access(&mut self, key: &K) {
        self.inner_mut().record_access(key);
    }

    fn record_ttl(&mut self, key: &K, ttl: Option<Duration>) {
        self.inner_mut().record_ttl(key, ttl);
    }

    fn eviction_key(&self) -> Option<K> {
        self.inner().eviction_key()
    }

    fn remove_key(&mut self, key: &K) {
        self.inner_mut().remove_key(key);
    }

    fn clear(&mut self) {
        self.inner_mut().clear();
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn contains(&self, key: &K) -> bool {
        self.inner().contains(key)
    }
}

impl<K: CacheKey> fmt::Debug for Strategy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name())
            .field("tracked", &self.len())
            .finish()
    }
}
