//! Time-to-live cache over session storage
//!
//! Entries are stored as JSON under `"<prefix>:<key>"`:
//!
//! ```json
//! { "timestamp": 1718000000000, "data": { ... } }
//! ```
//!
//! Feed caches use `items` (an array) instead of `data`.

use crate::clock::Clock;
use crate::error::CacheResult;
use crate::storage::SessionStorage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Name of the JSON field holding the cached payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadField {
    /// Opaque JSON document (`data`)
    Data,
    /// JSON array of items (`items`)
    Items,
}

impl PayloadField {
    /// Field name as written to storage
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Items => "items",
        }
    }

    fn accepts(self, payload: &Value) -> bool {
        match self {
            Self::Data => !payload.is_null(),
            Self::Items => payload.is_array(),
        }
    }
}

impl fmt::Display for PayloadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded cache entry
///
/// Entries are replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Caller key (without prefix)
    pub key: String,
    /// Write time in epoch millis
    pub timestamp: i64,
    /// Cached JSON payload
    pub payload: Value,
}

impl CacheEntry {
    /// `now - timestamp <= ttl`
    #[inline]
    #[must_use]
    pub fn is_valid(&self, now_millis: i64, ttl: Duration) -> bool {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_sub(self.timestamp) <= ttl_millis
    }
}

/// Key → payload store with expiry
#[derive(Debug, Clone)]
pub struct TtlCache {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    prefix: String,
    ttl: Duration,
    field: PayloadField,
}

impl TtlCache {
    /// Create cache over `storage`
    #[must_use]
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
        ttl: Duration,
        field: PayloadField,
    ) -> Self {
        Self {
            storage,
            clock,
            prefix: prefix.into(),
            ttl,
            field,
        }
    }

    /// Storage key for a caller key
    #[inline]
    #[must_use]
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Configured time-to-live
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured key prefix
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Read a valid entry
    ///
    /// Unreadable entries are reported absent and left alone. Expired entries
    /// are reported absent and removed.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<CacheEntry> {
        let storage_key = self.storage_key(key);
        let raw = self.storage.get(&storage_key)?;

        let Some(entry) = self.decode(key, &raw) else {
            tracing::debug!(key = %storage_key, "ignoring unreadable cache entry");
            return None;
        };

        if !entry.is_valid(self.clock.now_millis(), self.ttl) {
            tracing::debug!(key = %storage_key, "cache entry expired");
            self.storage.remove(&storage_key);
            return None;
        }

        tracing::debug!(key = %storage_key, "cache hit");
        Some(entry)
    }

    /// Read a valid payload
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(key).map(|entry| entry.payload)
    }

    /// Write a fresh entry stamped with the current time
    ///
    /// The entry is fully encoded before the single storage write.
    ///
    /// # Errors
    /// - `CacheError::Encode` if the payload cannot be serialized
    /// - `CacheError::Storage` if the backend rejects the write
    pub fn write(&self, key: &str, payload: &Value) -> CacheResult<()> {
        let mut entry = Map::new();
        entry.insert("timestamp".to_string(), Value::from(self.clock.now_millis()));
        entry.insert(self.field.as_str().to_string(), payload.clone());
        let encoded = serde_json::to_string(&entry)?;

        self.storage.set(&self.storage_key(key), &encoded)?;
        Ok(())
    }

    /// Best-effort write: failures are logged and dropped
    pub fn put(&self, key: &str, payload: &Value) {
        if let Err(err) = self.write(key, payload) {
            tracing::debug!(key = %self.storage_key(key), error = %err, "cache write skipped");
        }
    }

    /// Remove the entry for `key`
    #[inline]
    pub fn invalidate(&self, key: &str) {
        self.storage.remove(&self.storage_key(key));
    }

    fn decode(&self, key: &str, raw: &str) -> Option<CacheEntry> {
        let Value::Object(mut map) = serde_json::from_str::<Value>(raw).ok()? else {
            return None;
        };
        let timestamp = map.get("timestamp").and_then(Value::as_i64)?;
        if timestamp == 0 {
            return None;
        }
        let payload = map.remove(self.field.as_str())?;
        if !self.field.accepts(&payload) {
            return None;
        }
        Some(CacheEntry {
            key: key.to_string(),
            timestamp,
            payload,
        })
    }
}
