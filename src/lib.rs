//! cacheplex: a bounded in-memory cache engine with pluggable eviction
//! strategies, plus a scorer that routes values to abstract storage backends.
//!
//! ## Layout
//!
//! - [`store::BoundedCache`]: enforces item and byte limits, lazy TTL expiry.
//! - [`policy`]: LRU, LFU, FIFO, MRU, Random, TTL and Adaptive strategies,
//!   the [`policy::Strategy`] enum and the name-based [`policy::StrategyRegistry`].
//! - [`ds`]: the indexed [`ds::MinHeap`] and the arena-backed [`ds::OrderList`].
//! - [`selector::BackendSelector`]: picks a backend class from size, TTL and kind.
//! - [`store::StorageBackend`]: the adapter contract, with
//!   [`store::MemoryBackend`] as the in-process implementation.
//! - [`batch`]: multi-key helpers with bounded parallel I/O.
//! - [`builder::CacheBuilder`]: fluent and serde-driven construction.
//!
//! The engine is single-owner; share it across threads behind one lock.

pub mod batch;
pub mod builder;
pub mod clock;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod selector;
pub mod store;
pub mod traits;
