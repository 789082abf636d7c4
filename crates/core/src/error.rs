//! Error types for txcache
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! A missing key is never an error: lookups return `Ok(None)`.

use crate::types::ResourceId;
use std::io;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Error types for the transaction-aware cache layer
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying cache failed an operation
    #[error("Cache backend error in '{cache}': {message}")]
    Backend {
        /// Name of the cache that failed
        cache: String,
        /// Backend-provided description
        message: String,
    },

    /// A cached value could not be viewed as the requested type
    #[error("Type mismatch: cached value cannot be viewed as {expected}")]
    TypeMismatch {
        /// Name of the requested type
        expected: &'static str,
    },

    /// No cache registered under the requested name
    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    /// A cache with the same name is already registered
    #[error("Cache already registered: {0}")]
    CacheAlreadyRegistered(String),

    /// The calling thread already runs a transaction
    #[error("Transaction {0} is already active on this thread")]
    TransactionAlreadyActive(u64),

    /// The operation requires an active transaction
    #[error("No active transaction")]
    NoActiveTransaction,

    /// A resource is already bound under this identity in the current transaction
    #[error("Resource already bound: {0:?}")]
    ResourceAlreadyBound(ResourceId),

    /// The resource bound under this identity has an unexpected type
    #[error("Resource type mismatch: {0:?}")]
    ResourceTypeMismatch(ResourceId),

    /// Replaying a write buffer into the underlying cache failed after commit
    #[error("Flush of cache '{cache}' failed after commit: {source}")]
    FlushFailed {
        /// Name of the cache being flushed
        cache: String,
        /// Error raised by the underlying cache
        #[source]
        source: Box<CacheError>,
    },

    /// One or more completion callbacks failed
    #[error("{} completion callback(s) failed", .0.len())]
    Completion(Vec<CacheError>),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CacheError {
    /// Create a backend error for the named cache
    pub fn backend(cache: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Backend {
            cache: cache.into(),
            message: message.into(),
        }
    }

    /// Create a type mismatch error for the requested type `T`
    pub fn type_mismatch<T>() -> Self {
        CacheError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        }
    }

    /// Check if this error was raised by an underlying cache
    pub fn is_backend(&self) -> bool {
        matches!(self, CacheError::Backend { .. })
    }
}
