//! TTL-checked cache over a key-value store
//!
//! Provides a `CacheManager` that stores serializable data as JSON next to a
//! write timestamp and reports entries older than the TTL as misses.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::store::{CacheError, KeyValueStore};

/// Default time-to-live for cached entries: one hour
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Result of reading from cache, including metadata about cache freshness
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was written
    pub cached_at: DateTime<Utc>,
    /// Whether the entry is at least `ttl` old
    pub is_expired: bool,
}

/// Reads and writes TTL-checked entries
///
/// The store is shared, so clones of a manager see the same entries.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager").field("ttl", &self.ttl).finish()
    }
}

impl CacheManager {
    /// Creates a manager over `store` with the given time-to-live
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn timestamp_key(key: &str) -> String {
        format!("{}_timestamp", key)
    }

    /// Returns the payload for `key` if it is younger than the TTL.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    /// Same as [`get`](Self::get) with an explicit current time
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let cached = self.read_at::<T>(key, now)?;
        if cached.is_expired {
            debug!(key, cached_at = %cached.cached_at, "Cache entry is stale");
            return None;
        }
        debug!(key, "Cache hit");
        Some(cached.data)
    }

    /// Reads an entry regardless of age
    ///
    /// Returns `None` when either record is missing or unreadable.
    pub fn read_at<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<CachedData<T>> {
        let (payload, stamp) = match self.read_records(key) {
            Ok(Some(records)) => records,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(err) => {
                warn!(key, error = %err, "Failed to read cache entry");
                return None;
            }
        };

        let stored_ms: i64 = match stamp.trim().parse() {
            Ok(ms) => ms,
            Err(_) => {
                warn!(key, "Ignoring cache entry with invalid timestamp");
                return None;
            }
        };
        let cached_at = DateTime::from_timestamp_millis(stored_ms)?;

        let data: T = match serde_json::from_str(&payload) {
            Ok(data) => data,
            Err(err) => {
                warn!(key, error = %err, "Ignoring unparsable cache entry");
                return None;
            }
        };

        let age_ms = now.timestamp_millis().saturating_sub(stored_ms);
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);

        Some(CachedData {
            data,
            cached_at,
            is_expired: age_ms >= ttl_ms,
        })
    }

    fn read_records(&self, key: &str) -> Result<Option<(String, String)>, CacheError> {
        let Some(payload) = self.store.get_item(key)? else {
            return Ok(None);
        };
        let Some(stamp) = self.store.get_item(&Self::timestamp_key(key))? else {
            return Ok(None);
        };
        Ok(Some((payload, stamp)))
    }

    /// Stores `data` under `key` stamped with the current time.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<(), CacheError> {
        self.put_at(key, data, Utc::now())
    }

    /// Same as [`put`](Self::put) with an explicit write time
    pub fn put_at<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(data)?;
        self.store.set_item(key, &json)?;
        self.store
            .set_item(&Self::timestamp_key(key), &now.timestamp_millis().to_string())?;
        debug!(key, "Cache entry written");
        Ok(())
    }

    /// Removes both records for `key`.
    pub fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.store.remove_item(key)?;
        self.store.remove_item(&Self::timestamp_key(key))?;
        debug!(key, "Cache entry invalidated");
        Ok(())
    }
}
