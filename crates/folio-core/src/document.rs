//! Host document capability
//!
//! The page never touches a real DOM. It reads layout and writes scroll
//! behaviour, scroll position and the URL fragment through [`Document`].
//! [`MemoryDocument`] is a headless implementation driven by a
//! [`LayoutSnapshot`], used by the CLI and the tests.

use crate::section::{NavCandidate, SectionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root scroll-behaviour style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    /// No inline style
    #[default]
    Unset,
    /// Animated scrolling
    Smooth,
    /// Jump without animation
    Instant,
}

/// Layout reads and scroll writes against the host page
///
/// Methods take `&self`; implementations use interior mutability.
pub trait Document: Send + Sync {
    /// Top offset of section `id`, or `None` if it is not mounted
    fn offset_top(&self, id: &SectionId) -> Option<f64>;

    /// Current vertical scroll offset
    fn scroll_y(&self) -> f64;

    /// Viewport height
    fn viewport_height(&self) -> f64;

    /// Scroll section `id` to the top of the viewport
    fn scroll_into_view(&self, id: &SectionId);

    /// Current root scroll behaviour
    fn scroll_behavior(&self) -> ScrollBehavior;

    /// Set root scroll behaviour
    fn set_scroll_behavior(&self, behavior: ScrollBehavior);

    /// Raw URL fragment, including any leading `#`
    fn fragment(&self) -> String;

    /// Replace the URL fragment without adding a history entry
    fn replace_fragment(&self, id: &SectionId);
}

/// A mounted section and its offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Section id
    pub id: SectionId,
    /// Top offset within the document
    pub offset_top: f64,
}

impl Anchor {
    /// Create an anchor
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<SectionId>, offset_top: f64) -> Self {
        Self {
            id: id.into(),
            offset_top,
        }
    }
}

/// Point-in-time layout: scroll position, viewport and mounted anchors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSnapshot {
    /// Vertical scroll offset
    pub scroll_y: f64,
    /// Viewport height
    pub viewport_height: f64,
    /// Mounted anchors, ascending by offset then id once sorted
    pub anchors: Vec<Anchor>,
}

impl LayoutSnapshot {
    /// Read the layout of the enabled `candidates`
    ///
    /// Candidates without a mounted element are dropped.
    #[must_use]
    pub fn capture(doc: &dyn Document, candidates: &[NavCandidate]) -> Self {
        let anchors = candidates
            .iter()
            .filter(|c| c.enabled)
            .filter_map(|c| doc.offset_top(&c.id).map(|offset| Anchor::new(c.id.clone(), offset)))
            .collect();
        Self {
            scroll_y: doc.scroll_y(),
            viewport_height: doc.viewport_height(),
            anchors,
        }
        .sorted()
    }

    /// Sort anchors by offset, ties broken by id
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.anchors.sort_by(|a, b| {
            a.offset_top
                .total_cmp(&b.offset_top)
                .then_with(|| a.id.cmp(&b.id))
        });
        self
    }

    /// Pivot line: scroll offset plus `fraction` of the viewport
    #[inline]
    #[must_use]
    pub fn pivot(&self, fraction: f64) -> f64 {
        self.scroll_y + self.viewport_height * fraction
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    anchors: BTreeMap<SectionId, f64>,
    scroll_y: f64,
    viewport_height: f64,
    behavior: ScrollBehavior,
    fragment: String,
    scrolls: Vec<(SectionId, ScrollBehavior)>,
}

/// Headless [`Document`]
///
/// `scroll_into_view` moves the scroll offset to the anchor and records the
/// behaviour in effect at that moment.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    state: Mutex<MemoryState>,
}

impl MemoryDocument {
    /// Empty document with the given viewport height
    #[must_use]
    pub fn new(viewport_height: f64) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                viewport_height,
                ..MemoryState::default()
            }),
        }
    }

    /// Document laid out as `snapshot`
    #[must_use]
    pub fn from_layout(snapshot: &LayoutSnapshot) -> Self {
        let doc = Self::new(snapshot.viewport_height);
        doc.scroll_to(snapshot.scroll_y);
        for anchor in &snapshot.anchors {
            doc.mount(anchor.id.clone(), anchor.offset_top);
        }
        doc
    }

    /// With URL fragment
    #[must_use]
    pub fn with_fragment(self, fragment: impl Into<String>) -> Self {
        self.state.lock().fragment = fragment.into();
        self
    }

    /// Mount (or move) section `id` at `offset_top`
    pub fn mount(&self, id: impl Into<SectionId>, offset_top: f64) {
        self.state.lock().anchors.insert(id.into(), offset_top);
    }

    /// Remove section `id`
    pub fn unmount(&self, id: &str) {
        self.state.lock().anchors.remove(id);
    }

    /// Set scroll offset
    pub fn scroll_to(&self, scroll_y: f64) {
        self.state.lock().scroll_y = scroll_y;
    }

    /// Set viewport height
    pub fn resize(&self, viewport_height: f64) {
        self.state.lock().viewport_height = viewport_height;
    }

    /// Every `scroll_into_view` so far, with the behaviour in effect
    #[must_use]
    pub fn scrolls(&self) -> Vec<(SectionId, ScrollBehavior)> {
        self.state.lock().scrolls.clone()
    }
}

impl Document for MemoryDocument {
    fn offset_top(&self, id: &SectionId) -> Option<f64> {
        self.state.lock().anchors.get(id).copied()
    }

    fn scroll_y(&self) -> f64 {
        self.state.lock().scroll_y
    }

    fn viewport_height(&self) -> f64 {
        self.state.lock().viewport_height
    }

    fn scroll_into_view(&self, id: &SectionId) {
        let mut state = self.state.lock();
        if let Some(offset) = state.anchors.get(id).copied() {
            state.scroll_y = offset;
        }
        let behavior = state.behavior;
        state.scrolls.push((id.clone(), behavior));
    }

    fn scroll_behavior(&self) -> ScrollBehavior {
        self.state.lock().behavior
    }

    fn set_scroll_behavior(&self, behavior: ScrollBehavior) {
        self.state.lock().behavior = behavior;
    }

    fn fragment(&self) -> String {
        self.state.lock().fragment.clone()
    }

    fn replace_fragment(&self, id: &SectionId) {
        self.state.lock().fragment = id.fragment();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::nav_candidates;
    use serde_json::json;

    #[test]
    fn capture_drops_unmounted_and_disabled() {
        let doc = MemoryDocument::new(1000.0);
        doc.mount("contact", 3000.0);
        doc.mount("hero", 0.0);
        doc.mount("about", 800.0);

        // about is mounted but not enabled in an empty payload
        let snapshot = LayoutSnapshot::capture(&doc, &nav_candidates(&json!({})));
        let ids: Vec<_> = snapshot.anchors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["hero", "contact"]);
        assert!((snapshot.viewport_height - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_offsets_sort_by_id() {
        let snapshot = LayoutSnapshot {
            scroll_y: 0.0,
            viewport_height: 100.0,
            anchors: vec![Anchor::new("tech", 50.0), Anchor::new("resume", 50.0)],
        }
        .sorted();
        assert_eq!(snapshot.anchors[0].id.as_str(), "resume");
    }

    #[test]
    fn scroll_into_view_records_behavior() {
        let doc = MemoryDocument::new(500.0).with_fragment("#tech");
        doc.mount("tech", 1200.0);
        doc.set_scroll_behavior(ScrollBehavior::Instant);
        doc.scroll_into_view(&SectionId::new("tech"));

        assert!((doc.scroll_y() - 1200.0).abs() < f64::EPSILON);
        assert_eq!(doc.scrolls(), [(SectionId::new("tech"), ScrollBehavior::Instant)]);
        assert_eq!(doc.fragment(), "#tech");
    }

    #[test]
    fn layout_snapshot_parses_from_json() {
        let snapshot: LayoutSnapshot = serde_json::from_value(json!({
            "scroll_y": 10.0,
            "viewport_height": 900.0,
            "anchors": [{ "id": "hero", "offset_top": 0.0 }]
        }))
        .unwrap();
        assert_eq!(snapshot.anchors, [Anchor::new("hero", 0.0)]);
        assert!((snapshot.pivot(0.5) - 460.0).abs() < f64::EPSILON);
    }
}
