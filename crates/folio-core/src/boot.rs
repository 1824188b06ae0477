//! Boot / readiness gate
//!
//! The loader may finish only once the boot timer has elapsed and no
//! foreground data load is in flight. The boot timer itself waits for both a
//! minimum delay and a best-effort font readiness signal; a failing font
//! probe never blocks boot.
//!
//! `Pending → Ready` is latched: a later reload raising `loading` does not
//! re-arm the gate.

use crate::error::FontError;
use folio_data::Latch;
use futures::future::BoxFuture;
use std::time::Duration;

/// Host font readiness signal
pub type FontReady = BoxFuture<'static, Result<(), FontError>>;

/// Font signal for hosts without a font API: ready at once
#[must_use]
pub fn fonts_ready() -> FontReady {
    Box::pin(async { Ok(()) })
}

/// Wait for both the minimum boot `delay` and `fonts`
///
/// Font failures are logged and treated as ready.
pub async fn boot_timer(delay: Duration, fonts: FontReady) {
    let fonts = async move {
        if let Err(err) = fonts.await {
            tracing::debug!(error = %err, "continuing boot without fonts");
        }
    };
    tokio::join!(fonts, tokio::time::sleep(delay));
}

/// Boot phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BootState {
    /// Boot timer or foreground data load outstanding
    #[default]
    Pending,
    /// Terminal: loader may finish
    Ready,
}

/// Combines the boot timer with the data loading flag
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    timer_elapsed: bool,
    data_loading: bool,
    ready: Latch,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    /// New gate: timer running, data loading
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timer_elapsed: false,
            data_loading: true,
            ready: Latch::new(),
        }
    }

    /// Record that the boot timer finished
    pub fn mark_timer_elapsed(&mut self) -> BootState {
        self.timer_elapsed = true;
        self.refresh()
    }

    /// Record the data layer's `loading` flag
    pub fn set_data_loading(&mut self, loading: bool) -> BootState {
        self.data_loading = loading;
        self.refresh()
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn state(&self) -> BootState {
        if self.ready.is_done() {
            BootState::Ready
        } else {
            BootState::Pending
        }
    }

    /// Whether the boot timer has elapsed
    #[inline]
    #[must_use]
    pub fn timer_elapsed(&self) -> bool {
        self.timer_elapsed
    }

    /// Whether the loader may finish
    #[inline]
    #[must_use]
    pub fn can_finish(&self) -> bool {
        self.ready.is_done()
    }

    fn refresh(&mut self) -> BootState {
        if self.timer_elapsed && !self.data_loading && self.ready.trip() {
            tracing::info!("boot complete");
        }
        self.state()
    }
}
