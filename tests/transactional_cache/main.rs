//! End-to-end tests for transaction-aware caches
//!
//! Exercises the facade crate the way an application would: an injected
//! `TransactionManager`, decorated `InMemoryCache` backends, and the
//! name-based `TxAwareCacheManager`.
//!
//! ## Running These Tests
//!
//! ```bash
//! cargo test --test transactional_cache
//! cargo test --test transactional_cache -- --nocapture
//! ```

mod common;
mod failures;
mod manager;
mod scenarios;
