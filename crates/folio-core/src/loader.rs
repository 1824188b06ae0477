//! Loader collaborator and content veil
//!
//! An external loader animation reports progress and completion. While it is
//! shown, the page content sits behind a veil whose opacity, scale and blur
//! follow the progress; once the loader reports done it never returns.

use folio_data::Latch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Event reported by the loader
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoaderEvent {
    /// Progress percentage
    Progress(f64),
    /// Loader animation finished
    Done,
}

/// Visual parameters of the content veil
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VeilStyle {
    /// Content opacity
    pub opacity: f64,
    /// Content scale
    pub scale: f64,
    /// Blur radius in pixels
    pub blur_px: f64,
}

impl VeilStyle {
    /// Fully revealed content
    pub const REVEALED: Self = Self {
        opacity: 1.0,
        scale: 1.0,
        blur_px: 0.0,
    };

    /// Inline CSS declarations
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "opacity: {}; transform: scale({}); filter: blur({}px); \
             transition: filter .25s ease, opacity .25s ease, transform .25s ease",
            self.opacity, self.scale, self.blur_px
        )
    }
}

/// Veil for `progress` (0..=100)
///
/// A hidden loader means fully revealed content.
#[must_use]
pub fn veil(progress: f64, show_loader: bool) -> VeilStyle {
    let t = if show_loader { progress / 100.0 } else { 1.0 };
    VeilStyle {
        opacity: (0.3 + 0.7 * t).max(0.2),
        scale: 0.98 + 0.02 * t,
        blur_px: (6.0 - 6.0 * t).max(0.0),
    }
}

/// Whether `payload` wants the loader: it must hold data and not opt out
/// with `useLoader: false`
#[must_use]
pub fn wants_loader(payload: &Value) -> bool {
    let has_data = payload.as_object().is_some_and(|m| !m.is_empty());
    has_data && payload.get("useLoader") != Some(&Value::Bool(false))
}

/// Boot log lines shown by the loader
#[must_use]
pub fn boot_log_lines(fetching: bool) -> Vec<String> {
    let net = if fetching {
        "[NET]  fetching /data.json…"
    } else {
        "[NET]  cache hit /data.json"
    };
    [
        "[BOOT] mounting modules…",
        net,
        "[OK]   core:init ✓",
        "[OK]   shaders:compile (3 targets) ✓",
        "[OK]   assets:prefetch (svg, png, json) ✓",
        "[SEC]  CSP ok | sandbox ok",
        "[SYS]  cache primed | delta-ready",
        "[DONE]  running!",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Props handed to the loader
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LoaderProps {
    /// Whether the loader is visible
    pub show: bool,
    /// Whether the loader may complete
    pub can_finish: bool,
    /// Minimum time the loader stays up
    pub min_duration: Duration,
    /// Boot log lines
    pub logs: Vec<String>,
}

/// Progress and completion of the loader
#[derive(Debug, Clone, Default)]
pub struct LoaderState {
    progress: f64,
    finished: Latch,
}

impl LoaderState {
    /// Fresh loader at 0 %
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported progress
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Whether the loader has reported completion
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.is_done()
    }

    /// Apply a loader event; returns `true` if it finished the loader
    pub fn apply(&mut self, event: LoaderEvent) -> bool {
        match event {
            LoaderEvent::Progress(pct) => {
                self.progress = if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) };
                false
            }
            LoaderEvent::Done => {
                let finished = self.finished.trip();
                if finished {
                    tracing::debug!(progress = self.progress, "loader finished");
                }
                finished
            }
        }
    }

    /// Whether the loader is shown for `payload`
    #[must_use]
    pub fn show(&self, payload: &Value) -> bool {
        wants_loader(payload) && !self.is_finished()
    }

    /// Current veil
    #[must_use]
    pub fn veil(&self, payload: &Value) -> VeilStyle {
        veil(self.progress, self.show(payload))
    }

    /// Inline content style; `None` once the loader is hidden
    #[must_use]
    pub fn content_style(&self, payload: &Value) -> Option<String> {
        self.show(payload).then(|| self.veil(payload).css())
    }

    /// Props for the loader
    #[must_use]
    pub fn props(&self, payload: &Value, can_finish: bool, fetching: bool, min_duration: Duration) -> LoaderProps {
        LoaderProps {
            show: self.show(payload),
            can_finish,
            min_duration,
            logs: boot_log_lines(fetching),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn veil_endpoints() {
        let start = veil(0.0, true);
        assert!(close(start.opacity, 0.3));
        assert!(close(start.scale, 0.98));
        assert!(close(start.blur_px, 6.0));

        let mid = veil(50.0, true);
        assert!(close(mid.opacity, 0.65));
        assert!(close(mid.scale, 0.99));
        assert!(close(mid.blur_px, 3.0));

        for end in [veil(100.0, true), veil(0.0, false)] {
            assert!(close(end.opacity, 1.0));
            assert!(close(end.scale, 1.0));
            assert!(close(end.blur_px, 0.0));
        }
    }

    #[test]
    fn opacity_floor_and_blur_floor() {
        let below = veil(-50.0, true);
        assert!(close(below.opacity, 0.2));
        let above = veil(150.0, true);
        assert!(close(above.blur_px, 0.0));
    }

    #[test]
    fn loader_opt_out_and_empty_payload() {
        assert!(wants_loader(&json!({ "hero": {} })));
        assert!(!wants_loader(&json!({ "hero": {}, "useLoader": false })));
        assert!(wants_loader(&json!({ "hero": {}, "useLoader": "no" })));
        assert!(!wants_loader(&json!({})));
    }

    #[test]
    fn done_is_permanent() {
        let payload = json!({ "hero": {} });
        let mut loader = LoaderState::new();
        loader.apply(LoaderEvent::Progress(40.0));
        assert!(loader.show(&payload));
        assert!(loader.content_style(&payload).is_some());

        assert!(loader.apply(LoaderEvent::Done));
        assert!(!loader.apply(LoaderEvent::Done));
        loader.apply(LoaderEvent::Progress(10.0));
        assert!(!loader.show(&payload));
        assert!(close(loader.veil(&payload).blur_px, 0.0));
        assert_eq!(loader.content_style(&payload), None);
    }

    #[test]
    fn progress_is_clamped() {
        let mut loader = LoaderState::new();
        loader.apply(LoaderEvent::Progress(250.0));
        assert!(close(loader.progress(), 100.0));
        loader.apply(LoaderEvent::Progress(f64::NAN));
        assert!(close(loader.progress(), 0.0));
    }

    #[test]
    fn css_and_logs() {
        assert_eq!(
            VeilStyle::REVEALED.css(),
            "opacity: 1; transform: scale(1); filter: blur(0px); \
             transition: filter .25s ease, opacity .25s ease, transform .25s ease"
        );
        let logs = boot_log_lines(true);
        assert_eq!(logs.len(), 8);
        assert_eq!(logs[1], "[NET]  fetching /data.json…");
        assert_eq!(boot_log_lines(false)[1], "[NET]  cache hit /data.json");
    }
}
