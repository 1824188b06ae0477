//! Folio Cache
//!
//! Session-scoped key/payload store with time-to-live expiry.
//!
//! # Architecture
//!
//! ```text
//! TtlCache ──(prefix:key)──→ SessionStorage (get / set / remove)
//!    │
//!    └── Clock (epoch millis)
//! ```
//!
//! Storage and time are injected capabilities, so the same cache runs against
//! an in-process [`MemoryStorage`] in tests and against whatever session store
//! a host provides in production.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use folio_cache::{MemoryStorage, PayloadField, SystemClock, TtlCache};
//!
//! let cache = TtlCache::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(SystemClock),
//!     "ty-app-data",
//!     Duration::from_secs(300),
//!     PayloadField::Data,
//! );
//!
//! cache.put("/data/data.json", &serde_json::json!({ "hero": {} }));
//! assert!(cache.get("/data/data.json").is_some());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod clock;
pub mod error;
pub mod storage;
pub mod ttl;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CacheResult, StorageError};
pub use storage::{MemoryStorage, SessionStorage};
pub use ttl::{CacheEntry, PayloadField, TtlCache};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the session cache
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::error::{CacheError, StorageError};
    pub use crate::storage::{MemoryStorage, SessionStorage};
    pub use crate::ttl::{PayloadField, TtlCache};
}
