//! Cache module for keeping API responses between runs
//!
//! This module provides a TTL-checked cache on top of a pluggable key-value
//! store. Each logical entry is kept as two records: the JSON payload under
//! its key and the write time (epoch milliseconds) under `<key>_timestamp`.
//! Stale entries are reported as misses at read time but stay in the store
//! until overwritten or explicitly invalidated.

mod manager;
mod store;

pub use manager::{CacheManager, CachedData, DEFAULT_TTL};
pub use store::{CacheError, FileStore, KeyValueStore, MemoryStore};
