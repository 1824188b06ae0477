//! Error types for the session cache
//!
//! Cache failures are never fatal to a page. They are surfaced here so that
//! callers which care (tests, diagnostics) can see them, while the
//! best-effort paths log and drop them.

/// Errors raised by a [`SessionStorage`](crate::SessionStorage) backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Write would exceed the storage quota
    #[error("storage quota exceeded: {requested} bytes requested, {available} available")]
    QuotaExceeded {
        /// Size of the rejected write
        requested: u64,
        /// Bytes still free before the write
        available: u64,
    },

    /// Storage backend cannot be used at all
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors during cache writes
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend rejected the write
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Entry could not be serialized
    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
