//! Error types for the cacheplex library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Top-level error returned by the bounded engine, the
//!   strategy registry and anything that forwards backend calls.
//! - [`AdapterError`]: Failures reported by a [`StorageBackend`](crate::store::StorageBackend)
//!   implementation. Forwarded unchanged.
//! - [`ConfigError`]: Invalid configuration (builder, selector, batch options).
//! - [`InvariantError`]: Returned by `check_invariants` methods when an
//!   internal data-structure invariant is broken. A correct build never
//!   produces one; treat it as a bug.
//!
//! ## Example Usage
//!
//! ```
//! use cacheplex::builder::CacheBuilder;
//! use cacheplex::error::CacheError;
//!
//! let err = CacheBuilder::<String>::new()
//!     .strategy("Belady")
//!     .build()
//!     .unwrap_err();
//! assert!(matches!(err, CacheError::StrategyNotFound(name) if name == "Belady"));
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Errors surfaced by the cache core.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A `put` could not satisfy the configured limits, even after every
    /// eviction candidate was exhausted (or a single value is larger than
    /// `max_bytes`).
    #[error(
        "capacity rejected: {size_bytes} byte entry does not fit (max_bytes={max_bytes:?}, max_items={max_items:?})"
    )]
    CapacityRejected {
        /// Weighed size of the rejected entry.
        size_bytes: u64,
        /// Configured byte limit, if any.
        max_bytes: Option<u64>,
        /// Configured item limit, if any.
        max_items: Option<u64>,
    },

    /// No factory is registered under the requested strategy name.
    #[error("eviction strategy not found: {0}")]
    StrategyNotFound(String),

    /// Error reported by a storage backend.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CacheError {
    /// Returns `true` for [`CacheError::CapacityRejected`].
    pub fn is_capacity_rejected(&self) -> bool {
        matches!(self, CacheError::CapacityRejected { .. })
    }
}

// ---------------------------------------------------------------------------
// AdapterError
// ---------------------------------------------------------------------------

/// Errors produced by storage backend adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The backend cannot be used in this environment.
    #[error("backend {backend} is unavailable: {reason}")]
    Unavailable {
        /// Backend name.
        backend: String,
        /// Why it is unavailable.
        reason: String,
    },

    /// The backend refused the write because it is out of space.
    #[error("backend {backend} quota exceeded writing {key}")]
    QuotaExceeded {
        /// Backend name.
        backend: String,
        /// Key being written.
        key: String,
    },

    /// The backend does not implement the requested operation.
    #[error("operation {0} is not supported by this backend")]
    NotSupported(&'static str),

    /// Compressing or decompressing a stored value failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when configuration parameters are invalid.
///
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use cacheplex::selector::SelectorConfig;
///
/// let mut config = SelectorConfig::default();
/// config.backend_priority.clear();
/// let err = config.validate().unwrap_err();
/// assert!(err.to_string().contains("backend_priority"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when an internal invariant is violated.
///
/// Produced by `check_invariants` on [`MinHeap`](crate::ds::MinHeap),
/// [`OrderList`](crate::ds::OrderList) and
/// [`BoundedCache`](crate::store::BoundedCache).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rejected_display_names_limits() {
        let err = CacheError::CapacityRejected {
            size_bytes: 2048,
            max_bytes: Some(1024),
            max_items: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("Some(1024)"));
        assert!(err.is_capacity_rejected());
    }

    #[test]
    fn strategy_not_found_display() {
        let err = CacheError::StrategyNotFound("ARC".into());
        assert_eq!(err.to_string(), "eviction strategy not found: ARC");
        assert!(!err.is_capacity_rejected());
    }

    #[test]
    fn adapter_error_is_transparent() {
        let err: CacheError = AdapterError::NotSupported("keys").into();
        assert_eq!(err.to_string(), "operation keys is not supported by this backend");
    }

    #[test]
    fn unavailable_backend_propagates_through_question_mark() {
        fn open(backend: &str) -> Result<(), CacheError> {
            Err::<(), _>(AdapterError::Unavailable {
                backend: backend.to_string(),
                reason: "no storage in this environment".into(),
            })?;
            Ok(())
        }

        let err = open("persistent").unwrap_err();
        match &err {
            CacheError::Adapter(AdapterError::Unavailable { backend, .. }) => {
                assert_eq!(backend, "persistent");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "backend persistent is unavailable: no storage in this environment"
        );
        assert!(!err.is_capacity_rejected());
    }

    #[test]
    fn adapter_other_keeps_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = AdapterError::Other(Box::new(io));
        assert!(err.source().is_some());
    }

    #[test]
    fn config_error_message_accessor() {
        let err = ConfigError::new("concurrency must be > 0");
        assert_eq!(err.message(), "concurrency must be > 0");
        assert_eq!(err.to_string(), "concurrency must be > 0");
        let wrapped: CacheError = err.clone().into();
        assert_eq!(wrapped.to_string(), err.to_string());
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("index map out of sync");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.message(), "index map out of sync");
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
        assert_send_sync::<CacheError>();
        assert_send_sync::<AdapterError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<InvariantError>();
    }
}
