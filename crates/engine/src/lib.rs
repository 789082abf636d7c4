//! Cache management for txcache
//!
//! This crate wires caches to transactions by name:
//! - TxCacheConfig: `txcache.toml` selecting the transactional caches
//! - TxAwareCacheManager: registry handing out decorated or plain caches
//!
//! The transaction context is injected; the manager never creates one.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache_manager;
pub mod config;

pub use cache_manager::TxAwareCacheManager;
pub use config::{TxCacheConfig, CONFIG_FILE_NAME};
