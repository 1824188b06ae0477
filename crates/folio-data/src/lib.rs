//! Folio Data - content payload acquisition
//!
//! Fetches the page's JSON content document, validates it, and keeps it in the
//! session cache so repeat visits within a session hydrate instantly.
//!
//! # Flow
//!
//! ```text
//! activate(url) ─→ TtlCache hit? ──yes─→ payload, loading = false
//!       │                                     │
//!       └───────────→ Fetcher::get(url) ──────┴─→ validate ─→ commit (if generation current)
//!                                                           └→ TtlCache::put
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_data::{DataAcquisition, HttpFetcher};
//!
//! let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(10))?);
//! let data = DataAcquisition::new(fetcher, cache, "/data/data.json");
//! data.activate("/data/data.json").await?;
//! println!("{:?}", data.snapshot().error);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod acquisition;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod latch;

// Re-exports for convenience
pub use acquisition::{DataAcquisition, DataSnapshot, LoadOptions};
pub use error::{ErrorKind, FetchError, FetchResult};
pub use feed::{FeedConfig, FeedItem, FeedLoader, FeedState};
pub use fetch::{decode_json_body, decode_json_object, FetchResponse, Fetcher, HttpFetcher};
pub use latch::{Latch, LatchState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for data acquisition
    pub use crate::acquisition::{DataAcquisition, DataSnapshot};
    pub use crate::error::{ErrorKind, FetchError};
    pub use crate::fetch::{FetchResponse, Fetcher, HttpFetcher};
    pub use crate::latch::Latch;
}
