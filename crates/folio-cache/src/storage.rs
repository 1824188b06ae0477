//! Session storage capability
//!
//! The cache never touches a global store directly. It is handed a
//! [`SessionStorage`] whose lifetime is the browsing session.

use crate::error::StorageError;
use moka::sync::Cache;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// String key/value store scoped to one session
///
/// `set` replaces the whole value for a key in one step; readers never see a
/// partially written value.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStorage: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// - `StorageError::QuotaExceeded` if the backend is full
    /// - `StorageError::Unavailable` if the backend refuses writes
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present
    fn remove(&self, key: &str);
}

impl fmt::Debug for dyn SessionStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn SessionStorage")
    }
}

/// In-process session store using moka
///
/// Models the browser session store: no entry-count bound, an optional byte
/// quota that rejects oversized writes instead of evicting, and an optional
/// idle timeout after which the whole session is considered over.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Cache<String, Arc<str>>,
    quota_bytes: Option<u64>,
}

impl MemoryStorage {
    /// Create unbounded store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Create store that rejects writes beyond `bytes` of keys plus values
    #[inline]
    #[must_use]
    pub fn with_quota(bytes: u64) -> Self {
        Self::build(Some(bytes), None)
    }

    /// Create store whose entries lapse after `idle` without access
    #[inline]
    #[must_use]
    pub fn with_session_idle(idle: Duration) -> Self {
        Self::build(None, Some(idle))
    }

    fn build(quota_bytes: Option<u64>, idle: Option<Duration>) -> Self {
        let mut builder = Cache::builder();
        if let Some(idle) = idle {
            builder = builder.time_to_idle(idle);
        }
        Self {
            inner: builder.build(),
            quota_bytes,
        }
    }

    /// Drop every entry, as when the browsing session ends
    #[inline]
    pub fn end_session(&self) {
        self.inner.invalidate_all();
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.iter().count()
    }

    /// Whether the store holds no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes used by keys and values, excluding `skip_key`
    fn used_bytes(&self, skip_key: &str) -> u64 {
        self.inner
            .iter()
            .filter(|(k, _)| k.as_str() != skip_key)
            .map(|(k, v)| weight(&k, &v))
            .sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn weight(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|v| v.to_string())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let requested = weight(key, value);
            let available = quota.saturating_sub(self.used_bytes(key));
            if requested > available {
                return Err(StorageError::QuotaExceeded {
                    requested,
                    available,
                });
            }
        }
        self.inner.insert(key.to_string(), Arc::from(value));
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.inner.invalidate(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let storage = MemoryStorage::new();
        storage.set("a", "1").unwrap();

        assert_eq!(storage.get("a").as_deref(), Some("1"));
        assert_eq!(storage.len(), 1);

        storage.remove("a");
        assert!(storage.get("a").is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(8);
        storage.set("k", "1234").unwrap();

        let err = storage.set("other", "123456").unwrap_err();
        assert_eq!(
            err,
            StorageError::QuotaExceeded {
                requested: 11,
                available: 3,
            }
        );
        assert!(storage.get("other").is_none());
        assert_eq!(storage.get("k").as_deref(), Some("1234"));
    }

    #[test]
    fn quota_ignores_value_being_replaced() {
        let storage = MemoryStorage::with_quota(8);
        storage.set("k", "1234567").unwrap();
        storage.set("k", "7654321").unwrap();
        assert_eq!(storage.get("k").as_deref(), Some("7654321"));
    }

    #[test]
    fn end_session_clears_everything() {
        let storage = MemoryStorage::new();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();

        storage.end_session();
        assert!(storage.get("a").is_none());
        assert!(storage.get("b").is_none());
    }

    #[test]
    fn accepted_writes_are_never_evicted() {
        let storage = MemoryStorage::new();
        for i in 0..4_096 {
            storage.set(&format!("ty-app-data:/site/{i}"), "{}").unwrap();
        }
        for i in 0..4_096 {
            assert!(
                storage.get(&format!("ty-app-data:/site/{i}")).is_some(),
                "entry {i} was dropped"
            );
        }
    }

    #[test]
    fn clones_share_contents() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set("a", "1").unwrap();
        assert_eq!(other.get("a").as_deref(), Some("1"));
    }
}
