//! Name → factory registry for eviction strategies.
//!
//! The registry is a plain value: build one with
//! [`StrategyRegistry::with_builtins`], register extra strategies on it, and
//! hand it to the [`CacheBuilder`](crate::builder::CacheBuilder) or to
//! [`BoundedCache::set_strategy_by_name`](crate::store::BoundedCache::set_strategy_by_name).
//! Names are matched case-insensitively; the spelling used at registration
//! is kept for display.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::CacheError;
use crate::policy::{Strategy, StrategyContext, StrategyKind};
use crate::traits::CacheKey;

/// Builds a fresh strategy instance.
pub type StrategyFactory<K> = Arc<dyn Fn(&StrategyContext) -> Strategy<K> + Send + Sync>;

struct Registration<K> {
    display_name: String,
    factory: StrategyFactory<K>,
}

impl<K> Clone for Registration<K> {
    fn clone(&self) -> Self {
        Self {
            display_name: self.display_name.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

/// Registry of strategy factories.
///
/// # Example
///
/// ```
/// use cacheplex::policy::{LruStrategy, Strategy, StrategyContext, StrategyRegistry};
/// use cacheplex::traits::EvictionStrategy;
///
/// let mut registry = StrategyRegistry::<String>::with_builtins();
/// registry.register("Recent", |_ctx| Strategy::custom(LruStrategy::new()));
///
/// let strategy = registry.create("recent", &StrategyContext::default()).unwrap();
/// assert_eq!(strategy.name(), "LRU");
/// assert!(registry.list_available().contains(&"Recent".to_string()));
/// ```
pub struct StrategyRegistry<K> {
    entries: FxHashMap<String, Registration<K>>,
    order: Vec<String>,
}

impl<K: CacheKey> StrategyRegistry<K> {
    /// Creates a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Creates a registry with the seven built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for kind in StrategyKind::ALL {
            registry.register(kind.name(), move |ctx| kind.build(ctx));
        }
        registry
    }

    /// Registers `factory` under `name`, replacing any factory already
    /// registered under the same (case-insensitive) name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&StrategyContext) -> Strategy<K> + Send + Sync + 'static,
    {
        let display_name = name.into();
        let lookup = normalize(&display_name);
        if !self.entries.contains_key(&lookup) {
            self.order.push(lookup.clone());
        }
        self.entries.insert(
            lookup,
            Registration {
                display_name,
                factory: Arc::new(factory),
            },
        );
    }

    /// Removes the factory for `name`; returns `true` if one was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let lookup = normalize(name);
        match self.entries.remove(&lookup) {
            Some(_) => {
                self.order.retain(|n| *n != lookup);
                true
            },
            None => false,
        }
    }

    /// Returns `true` if a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    /// Builds a new strategy registered under `name`.
    pub fn create(&self, name: &str, ctx: &StrategyContext) -> Result<Strategy<K>, CacheError> {
        self.entries
            .get(&normalize(name))
            .map(|registration| (registration.factory)(ctx))
            .ok_or_else(|| CacheError::StrategyNotFound(name.to_string()))
    }

    /// The registered names, in registration order, as originally spelled.
    pub fn list_available(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|lookup| self.entries.get(lookup))
            .map(|registration| registration.display_name.clone())
            .collect()
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: CacheKey> Default for StrategyRegistry<K> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<K> Clone for StrategyRegistry<K> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            order: self.order.clone(),
        }
    }
}

impl<K: CacheKey> fmt::Debug for StrategyRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("available", &self.list_available())
            .finish()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
