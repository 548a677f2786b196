//! Fluent construction of bounded caches.
//!
//! ## Example
//!
//! ```rust
//! use cacheplex::builder::CacheBuilder;
//!
//! let mut cache = CacheBuilder::<String>::new()
//!     .max_items(100)
//!     .max_bytes(64 * 1024)
//!     .strategy("lfu")
//!     .build()
//!     .unwrap();
//! cache.put("greeting".to_string(), b"hello".to_vec(), None).unwrap();
//! assert_eq!(cache.strategy_name(), "LFU");
//! ```
//!
//! [`EngineConfig`] is the serde-friendly subset of the builder, for loading
//! limits and the strategy name from a config file.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{system_clock, Clock};
use crate::error::CacheError;
use crate::policy::{Strategy, StrategyContext, StrategyRegistry};
use crate::store::{BoundedCache, Limits, Weigher};
use crate::traits::{CacheKey, EvictionStrategy};

/// Default eviction strategy name.
pub const DEFAULT_STRATEGY: &str = "LRU";

/// Serializable engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_items: Option<u64>,
    pub max_bytes: Option<u64>,
    /// Registry name of the eviction strategy (case-insensitive).
    pub strategy: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            max_bytes: None,
            strategy: DEFAULT_STRATEGY.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            max_items: self.max_items,
            max_bytes: self.max_bytes,
        }
    }
}

/// Builder for [`BoundedCache`].
pub struct CacheBuilder<K> {
    config: EngineConfig,
    strategy: Option<Strategy<K>>,
    clock: Option<Arc<dyn Clock>>,
    seed: Option<u64>,
    weigher: Option<Weigher<K>>,
    registry: Option<StrategyRegistry<K>>,
}

impl<K: CacheKey> CacheBuilder<K> {
    /// Unbounded LRU on the system clock.
    pub fn new() -> Self {
        Self::from_config(EngineConfig::default())
    }

    /// Starts from a loaded configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            strategy: None,
            clock: None,
            seed: None,
            weigher: None,
            registry: None,
        }
    }

    pub fn max_items(mut self, max_items: u64) -> Self {
        self.config.max_items = Some(max_items);
        self
    }

    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.config.max_bytes = Some(max_bytes);
        self
    }

    /// Selects the strategy by registry name.
    pub fn strategy(mut self, name: impl Into<String>) -> Self {
        self.config.strategy = name.into();
        self.strategy = None;
        self
    }

    /// Uses an already constructed strategy instead of a registry lookup.
    pub fn strategy_instance(mut self, strategy: Strategy<K>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Seed for randomised strategies. Defaults to the clock's current time.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides how entry sizes are computed (default: value length).
    pub fn weigher<F>(mut self, weigher: F) -> Self
    where
        F: Fn(&K, &[u8]) -> u64 + Send + Sync + 'static,
    {
        self.weigher = Some(Arc::new(weigher));
        self
    }

    /// Resolves strategy names against `registry` instead of the built-ins.
    pub fn registry(mut self, registry: StrategyRegistry<K>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// [`CacheError::StrategyNotFound`] if the strategy name is not registered.
    pub fn build(self) -> Result<BoundedCache<K>, CacheError> {
        let clock = self.clock.unwrap_or_else(system_clock);
        let seed = self.seed.unwrap_or_else(|| clock.now_millis());
        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => {
                let registry = self.registry.unwrap_or_default();
                let ctx = StrategyContext::new(Arc::clone(&clock), seed);
                registry.create(&self.config.strategy, &ctx)?
            },
        };

        debug!(
            strategy = strategy.name(),
            max_items = ?self.config.max_items,
            max_bytes = ?self.config.max_bytes,
            "bounded cache built"
        );

        let mut cache = BoundedCache::with_clock(self.config.limits(), strategy, clock);
        cache.set_seed(seed);
        if let Some(weigher) = self.weigher {
            cache.set_weigher(weigher);
        }
        Ok(cache)
    }
}

impl<K: CacheKey> Default for CacheBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey> fmt::Debug for CacheBuilder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("seed", &self.seed)
            .field("has_weigher", &self.weigher.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::{FifoStrategy, StrategyKind};

    #[test]
    fn defaults_to_unbounded_lru() {
        let cache = CacheBuilder::<u32>::new().build().unwrap();
        assert_eq!(cache.strategy_name(), "LRU");
        assert_eq!(cache.limits(), Limits::UNBOUNDED);
    }

    #[test]
    fn strategy_names_are_case_insensitive() {
        for name in ["ttl", "Ttl", "TTL"] {
            let cache = CacheBuilder::<u32>::new().strategy(name).build().unwrap();
            assert_eq!(cache.strategy().kind(), Some(StrategyKind::Ttl));
        }
    }

    #[test]
    fn unknown_strategy_fails() {
        let err = CacheBuilder::<u32>::new().strategy("Clock-Pro").build().unwrap_err();
        assert!(matches!(err, CacheError::StrategyNotFound(name) if name == "Clock-Pro"));
    }

    #[test]
    fn custom_registry_and_instance() {
        let mut registry = StrategyRegistry::empty();
        registry.register("queue", |_| Strategy::Fifo(FifoStrategy::new()));
        let cache = CacheBuilder::<u32>::new()
            .registry(registry.clone())
            .strategy("QUEUE")
            .build()
            .unwrap();
        assert_eq!(cache.strategy_name(), "FIFO");

        let missing = CacheBuilder::<u32>::new().registry(registry).build();
        assert!(missing.is_err(), "LRU is not in the custom registry");

        let cache = CacheBuilder::<u32>::new()
            .strategy_instance(Strategy::Fifo(FifoStrategy::new()))
            .build()
            .unwrap();
        assert_eq!(cache.strategy_name(), "FIFO");
    }

    #[test]
    fn weigher_overrides_value_length() {
        let mut cache = CacheBuilder::<String>::new()
            .max_bytes(10)
            .weigher(|key, value| (key.len() + value.len()) as u64)
            .build()
            .unwrap();
        cache.put("abc".into(), vec![0; 4], None).unwrap();
        assert_eq!(cache.total_bytes(), 7);
        assert!(cache.put("abcdef".into(), vec![0; 5], None).is_err());
    }

    #[test]
    fn clock_reaches_ttl_strategy() {
        let clock = ManualClock::shared(1_000);
        let mut cache = CacheBuilder::<u32>::new()
            .strategy("TTL")
            .clock(clock.clone())
            .build()
            .unwrap();
        cache.put(1, vec![1], Some(Duration::from_millis(50))).unwrap();
        match cache.strategy() {
            Strategy::Ttl(ttl) => assert_eq!(ttl.expires_at(&1), Some(1_050)),
            other => panic!("unexpected strategy {other:?}"),
        }
        clock.advance(Duration::from_millis(50));
        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = EngineConfig {
            max_items: Some(500),
            max_bytes: None,
            strategy: "Adaptive".into(),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: EngineConfig = serde_json::from_str(r#"{"max_bytes": 2048}"#).unwrap();
        assert_eq!(partial.strategy, DEFAULT_STRATEGY);
        assert_eq!(partial.limits(), Limits::bytes(2048));

        let cache = CacheBuilder::<u32>::from_config(back).seed(7).build().unwrap();
        assert_eq!(cache.strategy().name(), "Adaptive");
        assert_eq!(cache.limits().max_items, Some(500));
    }
}
