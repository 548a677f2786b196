//! Storage: the bounded engine and backend adapters.
//!
//! - [`bounded`]: [`BoundedCache`], the in-memory engine that enforces item
//!   and byte limits through an eviction strategy.
//! - [`memory`]: [`MemoryBackend`], a [`StorageBackend`] over the engine.
//! - [`traits`]: the backend contract and [`CacheMetrics`].

pub mod bounded;
pub mod memory;
pub mod traits;

pub use bounded::{BoundedCache, CacheEntry, Limits, Weigher};
pub use memory::MemoryBackend;
pub use traits::{CacheMetrics, StorageBackend, StorageUsage};
