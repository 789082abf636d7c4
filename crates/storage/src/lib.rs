//! Storage layer for txcache
//!
//! This crate implements the stock underlying cache:
//! - InMemoryCache: DashMap-backed `Cache` implementation
//!
//! Any other `Cache` implementation can be decorated the same way; this one
//! is the default backend and the fixture used throughout the test suites.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;

pub use memory::InMemoryCache;
