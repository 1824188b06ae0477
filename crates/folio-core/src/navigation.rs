//! Navigation synchronizer
//!
//! Tracks which section the reader is looking at. Every trigger funnels into
//! [`evaluate`], a pure function of a [`LayoutSnapshot`]:
//!
//! ```text
//! Scroll ──coalesce──→ AnimationFrame ─┐
//! Resize ─────────────────────────────┼─→ capture ─→ evaluate ─→ active
//! Mutation ───────────────────────────┤
//! set_candidates ─────────────────────┘
//! ```
//!
//! The active section is the last mounted anchor whose top is at or above
//! the pivot line (scroll offset plus a fraction of the viewport), or the
//! first anchor when the reader is above all of them.

use crate::document::{Document, LayoutSnapshot, ScrollBehavior};
use crate::section::{NavCandidate, SectionId};

/// Active section for `snapshot`
///
/// `snapshot.anchors` must be sorted (see [`LayoutSnapshot::sorted`]).
/// Returns `None` only when there are no anchors.
#[must_use]
pub fn evaluate(snapshot: &LayoutSnapshot, pivot_fraction: f64) -> Option<SectionId> {
    let first = snapshot.anchors.first()?;
    let pivot = snapshot.pivot(pivot_fraction);
    let current = snapshot
        .anchors
        .iter()
        .take_while(|anchor| anchor.offset_top <= pivot)
        .last()
        .unwrap_or(first);
    Some(current.id.clone())
}

/// Re-evaluation trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Scroll event; coalesced into the next animation frame
    Scroll,
    /// Animation frame callback
    AnimationFrame,
    /// Viewport resize; evaluated immediately
    Resize,
    /// Structural change under the page body; evaluated immediately
    Mutation,
}

/// What a trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// A frame was requested
    Scheduled,
    /// A frame was already pending
    Coalesced,
    /// Frame fired with nothing scheduled
    Idle,
    /// Evaluated; active section unchanged
    Unchanged,
    /// Evaluated; active section changed to the contained value
    Changed(Option<SectionId>),
}

impl Evaluation {
    /// Whether the active section changed
    #[inline]
    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Owner of the active section id
#[derive(Debug, Clone)]
pub struct NavigationSynchronizer {
    candidates: Vec<NavCandidate>,
    active: Option<SectionId>,
    pivot_fraction: f64,
    frame_pending: bool,
    sync_fragment: bool,
    restore_behavior: Option<ScrollBehavior>,
}

impl NavigationSynchronizer {
    /// Create synchronizer; the initial active section comes from `fragment`
    /// when it names an enabled candidate, else the first candidate
    #[must_use]
    pub fn new(candidates: Vec<NavCandidate>, fragment: &str, pivot_fraction: f64) -> Self {
        let mut nav = Self {
            candidates,
            active: SectionId::from_fragment(fragment),
            pivot_fraction,
            frame_pending: false,
            sync_fragment: true,
            restore_behavior: None,
        };
        nav.active = nav.fallback();
        nav
    }

    /// With fragment reflection on or off
    #[inline]
    #[must_use]
    pub fn with_fragment_sync(mut self, enabled: bool) -> Self {
        self.sync_fragment = enabled;
        self
    }

    /// Active section
    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<&SectionId> {
        self.active.as_ref()
    }

    /// All candidates, enabled or not
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &[NavCandidate] {
        &self.candidates
    }

    /// Enabled candidates in page order
    pub fn enabled(&self) -> impl Iterator<Item = &NavCandidate> {
        self.candidates.iter().filter(|c| c.enabled)
    }

    /// Whether `id` is an enabled candidate
    #[must_use]
    pub fn is_candidate(&self, id: &str) -> bool {
        self.enabled().any(|c| c.id.as_str() == id)
    }

    /// Whether an animation frame is pending
    #[inline]
    #[must_use]
    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Start listening: smooth scrolling on for the page's lifetime
    pub fn attach(&mut self, doc: &dyn Document) {
        if self.restore_behavior.is_none() {
            self.restore_behavior = Some(doc.scroll_behavior());
        }
        doc.set_scroll_behavior(ScrollBehavior::Smooth);
    }

    /// Stop listening: drop any pending frame and restore scroll behaviour
    pub fn detach(&mut self, doc: &dyn Document) {
        self.frame_pending = false;
        if let Some(previous) = self.restore_behavior.take() {
            doc.set_scroll_behavior(previous);
        }
    }

    /// Replace the candidate list and evaluate once
    pub fn set_candidates(&mut self, candidates: Vec<NavCandidate>, doc: &dyn Document) -> Evaluation {
        self.candidates = candidates;
        self.evaluate_now(doc)
    }

    /// Handle a trigger
    pub fn handle(&mut self, trigger: Trigger, doc: &dyn Document) -> Evaluation {
        match trigger {
            Trigger::Scroll if self.frame_pending => Evaluation::Coalesced,
            Trigger::Scroll => {
                self.frame_pending = true;
                Evaluation::Scheduled
            }
            Trigger::AnimationFrame if !self.frame_pending => Evaluation::Idle,
            Trigger::AnimationFrame => {
                self.frame_pending = false;
                self.evaluate_now(doc)
            }
            Trigger::Resize | Trigger::Mutation => self.evaluate_now(doc),
        }
    }

    /// Evaluate against the current layout
    pub fn evaluate_now(&mut self, doc: &dyn Document) -> Evaluation {
        let snapshot = LayoutSnapshot::capture(doc, &self.candidates);
        let next = evaluate(&snapshot, self.pivot_fraction).or_else(|| self.fallback());
        self.commit(next, doc)
    }

    /// Navigation click: activate `id` and scroll to it
    ///
    /// Ignored unless `id` is an enabled candidate.
    pub fn select(&mut self, id: &SectionId, doc: &dyn Document) -> Evaluation {
        if !self.is_candidate(id.as_str()) {
            tracing::debug!(section = %id, "ignoring selection of unknown section");
            return Evaluation::Unchanged;
        }
        let evaluation = self.commit(Some(id.clone()), doc);
        doc.scroll_into_view(id);
        evaluation
    }

    /// Activate `id` without evaluating; used by deep-link resolution
    pub(crate) fn force_active(&mut self, id: SectionId, doc: &dyn Document) -> Evaluation {
        tracing::debug!(section = %id, "active section forced");
        self.commit(Some(id), doc)
    }

    /// Current id if still a candidate, else the first candidate
    fn fallback(&self) -> Option<SectionId> {
        match &self.active {
            Some(id) if self.is_candidate(id.as_str()) => Some(id.clone()),
            _ => self.enabled().next().map(|c| c.id.clone()),
        }
    }

    fn commit(&mut self, next: Option<SectionId>, doc: &dyn Document) -> Evaluation {
        if next == self.active {
            return Evaluation::Unchanged;
        }
        tracing::trace!(from = ?self.active, to = ?next, "active section changed");
        if self.sync_fragment {
            if let Some(id) = &next {
                doc.replace_fragment(id);
            }
        }
        self.active.clone_from(&next);
        Evaluation::Changed(next)
    }
}
