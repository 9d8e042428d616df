//! Runtime configuration
//!
//! Defaults mirror the deployed backend (local API on port 5000, one hour
//! listing cache, three attempts two seconds apart, ten second timeout).
//! Command-line flags and environment variables override them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::cache::{CacheManager, FileStore, KeyValueStore, MemoryStore, DEFAULT_TTL};
use crate::catalog::CatalogLoader;
use crate::cli::Cli;
use crate::data::tmdb::{DEFAULT_TIMEOUT, USER_AGENT};
use crate::data::{BackendStore, TmdbClient};
use crate::error::FetchError;
use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};

/// Backend API root used when none is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Settings for building a [`CatalogLoader`]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend API root serving `/movies` and the `/tmdb` proxy
    pub api_url: String,
    /// Cache directory; `None` selects the XDG cache dir
    pub cache_dir: Option<PathBuf>,
    /// Whether listings are cached on disk
    pub persistent_cache: bool,
    /// How long cached listings stay fresh
    pub cache_ttl: Duration,
    /// Attempts per API request
    pub max_attempts: u32,
    /// Base delay between attempts
    pub retry_delay: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_dir: None,
            persistent_cache: true,
            cache_ttl: DEFAULT_TTL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_BASE_DELAY,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Applies command-line overrides on top of the defaults
    pub fn from_cli(cli: &Cli) -> Self {
        let defaults = Config::default();
        Self {
            api_url: cli.api_url.clone().unwrap_or(defaults.api_url),
            cache_dir: cli.cache_dir.clone(),
            persistent_cache: !cli.no_cache,
            cache_ttl: cli
                .cache_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            max_attempts: cli.retries.unwrap_or(defaults.max_attempts),
            retry_delay: cli
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            request_timeout: cli
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }

    /// Builds the listing cache.
    ///
    /// Falls back to an in-memory store when no cache directory can be found.
    pub fn cache_manager(&self) -> CacheManager {
        let store: Arc<dyn KeyValueStore> = if !self.persistent_cache {
            Arc::new(MemoryStore::new())
        } else if let Some(dir) = &self.cache_dir {
            Arc::new(FileStore::with_dir(dir.clone()))
        } else if let Some(store) = FileStore::new() {
            Arc::new(store)
        } else {
            warn!("No cache directory available, caching in memory only");
            Arc::new(MemoryStore::new())
        };
        CacheManager::new(store, self.cache_ttl)
    }

    /// Builds a loader talking to the configured backend
    pub fn build_loader(&self) -> Result<CatalogLoader, FetchError> {
        let client = Client::builder()
            .timeout(self.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let source = TmdbClient::with_client(client.clone(), self.api_url.clone());
        let store = BackendStore::with_client(client, self.api_url.clone());

        Ok(CatalogLoader::new(
            Arc::new(source),
            Arc::new(store),
            self.cache_manager(),
            self.retry_policy(),
        ))
    }
}
