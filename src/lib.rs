//! Movie catalog client library
//!
//! Exposes the catalog loader, the retry policy, the TTL cache and the
//! remote/store clients for the binary and for integration tests.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod retry;
