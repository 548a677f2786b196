pub use crate::batch::{BatchOptions, BatchReport};
pub use crate::builder::{CacheBuilder, EngineConfig};
pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use crate::error::{AdapterError, CacheError, ConfigError};
pub use crate::policy::{Strategy, StrategyContext, StrategyKind, StrategyRegistry};
pub use crate::selector::{BackendClass, BackendSelector, Selection, SelectorConfig, ValueKind};
pub use crate::store::{BoundedCache, CacheMetrics, Limits, MemoryBackend, StorageBackend};
pub use crate::traits::{CacheKey, Codec, EvictionStrategy};
