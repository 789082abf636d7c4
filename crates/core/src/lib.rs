//! Core types and traits for txcache
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: `CacheError` hierarchy and the `CacheResult` alias
//! - Value: dynamic value enum for heterogeneous caches
//! - Traits: `Cache` (the decorated capability), `CacheExt` (typed retrieval)
//! - Transaction traits: `TransactionContext`, `TransactionSynchronization`
//! - Types: `ResourceId`, `TransactionOutcome`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{CacheError, CacheResult};
pub use traits::{Cache, CacheExt, TransactionContext, TransactionSynchronization};
pub use types::{Resource, ResourceId, TransactionOutcome};
pub use value::Value;
