//! Folio Core - client-side page orchestration
//!
//! Decides which section of a single-page document the reader is looking
//! at, keeps the navigation in sync with that decision, honours deep links
//! on load, and gates the reveal of content behind a combined readiness
//! signal.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── Page::run ────────────────────────────┐
//! │ NavigationSynchronizer ← Trigger (scroll / frame / resize / mutation)│
//! │ DeepLinkResolver       ← fragment, mutations, deadline             │
//! │ ReadinessGate          ← boot_timer + DataSnapshot.loading         │
//! │ LoaderState            ← LoaderEvent (progress / done) → VeilStyle │
//! └───────────────────────────────┬───────────────────────────────────┘
//!                                 ↓
//!                         watch<PageView>
//! ```
//!
//! The host page is abstracted behind [`Document`]; [`MemoryDocument`] runs
//! the same logic headless.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_core::{Page, PageConfig, PageEvent, fonts_ready, http_data_acquisition};
//!
//! let config = PageConfig::from_env()?;
//! let data = http_data_acquisition(&config, Arc::new(MemoryStorage::new()))?;
//! let page = Page::new(config, document, data);
//! let mut view = page.subscribe();
//!
//! let (events, rx) = tokio::sync::mpsc::channel(64);
//! tokio::spawn(page.run(rx, fonts_ready()));
//! events.send(PageEvent::Scroll).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod boot;
pub mod config;
pub mod deep_link;
pub mod document;
pub mod error;
pub mod loader;
pub mod navigation;
pub mod page;
pub mod section;

// Re-exports for convenience
pub use boot::{boot_timer, fonts_ready, BootState, FontReady, ReadinessGate};
pub use config::PageConfig;
pub use deep_link::{DeepLinkOutcome, DeepLinkResolver, DeepLinkState};
pub use document::{Anchor, Document, LayoutSnapshot, MemoryDocument, ScrollBehavior};
pub use error::{FolioError, FolioResult, FontError};
pub use folio_data::{Latch, LatchState};
pub use loader::{
    boot_log_lines, veil, wants_loader, LoaderEvent, LoaderProps, LoaderState, VeilStyle,
};
pub use navigation::{evaluate, Evaluation, NavigationSynchronizer, Trigger};
pub use page::{http_data_acquisition, Page, PageEvent, PageView};
pub use section::{nav_candidates, NavCandidate, SectionId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for page orchestration
    pub use crate::config::PageConfig;
    pub use crate::document::{Document, LayoutSnapshot, MemoryDocument, ScrollBehavior};
    pub use crate::error::{FolioError, FolioResult};
    pub use crate::navigation::{Evaluation, NavigationSynchronizer, Trigger};
    pub use crate::page::{Page, PageEvent, PageView};
    pub use crate::section::SectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn empty_page_view_is_pending() {
        let view = PageView::default();
        assert_eq!(view.boot, BootState::Pending);
        assert_eq!(view.deep_link, DeepLinkState::Pending);
        assert!(!view.revealed);
    }
}
