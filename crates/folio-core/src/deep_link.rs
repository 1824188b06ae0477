//! One-shot deep-link resolution
//!
//! A URL fragment naming a section is honoured once per page lifetime. If
//! the target is already mounted the page jumps to it at once. Otherwise the
//! resolver watches structural mutations until the target appears, and gives
//! up after a timeout with one last attempt.
//!
//! ```text
//! Pending ──start──→ Done(Jumped)            target mounted
//!    │        └────→ Watching{deadline}      target not yet mounted
//!    │                 ├─ mutation ─→ Done(Jumped)
//!    │                 └─ deadline ─→ Done(Jumped | Abandoned)
//!    └─ no fragment ─→ Done(NoFragment)
//! ```
//!
//! A fragment that is not (yet) an enabled candidate leaves the resolver
//! pending; a later candidate change calls [`DeepLinkResolver::start`] again.

use crate::document::{Document, ScrollBehavior};
use crate::navigation::NavigationSynchronizer;
use crate::section::SectionId;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// How resolution ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "target", rename_all = "snake_case")]
pub enum DeepLinkOutcome {
    /// The URL carried no fragment
    NoFragment,
    /// Scrolled to the target
    Jumped(SectionId),
    /// Target never mounted before the deadline
    Abandoned(SectionId),
}

/// Resolver state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeepLinkState {
    /// Not started, or target not a candidate yet
    #[default]
    Pending,
    /// Waiting for the target to mount
    Watching {
        /// When the watch gives up
        deadline: Instant,
    },
    /// Terminal
    Done(DeepLinkOutcome),
}

/// Deep-link resolver for the fragment present at load
#[derive(Debug, Clone)]
pub struct DeepLinkResolver {
    target: Option<SectionId>,
    timeout: Duration,
    state: DeepLinkState,
}

impl DeepLinkResolver {
    /// Resolver for the raw load-time `fragment`
    #[must_use]
    pub fn new(fragment: &str, timeout: Duration) -> Self {
        Self {
            target: SectionId::from_fragment(fragment),
            timeout,
            state: DeepLinkState::Pending,
        }
    }

    /// Fragment target, if any
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&SectionId> {
        self.target.as_ref()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DeepLinkState {
        &self.state
    }

    /// Deadline of the active watch
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DeepLinkState::Watching { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Whether a mutation watch is attached
    #[inline]
    #[must_use]
    pub fn is_watching(&self) -> bool {
        matches!(self.state, DeepLinkState::Watching { .. })
    }

    /// Whether the one-shot has been used up
    #[inline]
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        matches!(self.state, DeepLinkState::Done(_))
    }

    /// Outcome once done
    #[must_use]
    pub fn outcome(&self) -> Option<&DeepLinkOutcome> {
        match &self.state {
            DeepLinkState::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// (Re)start resolution against the current candidates
    ///
    /// Called on mount and whenever the candidate list changes. A running
    /// watch is replaced with a fresh window. No-op once done.
    pub fn start(
        &mut self,
        nav: &mut NavigationSynchronizer,
        doc: &dyn Document,
        now: Instant,
    ) -> &DeepLinkState {
        if self.is_consumed() {
            return &self.state;
        }
        let Some(target) = self.target.clone() else {
            self.state = DeepLinkState::Done(DeepLinkOutcome::NoFragment);
            return &self.state;
        };
        if !nav.is_candidate(target.as_str()) {
            tracing::debug!(section = %target, "deep link target is not a section yet");
            self.state = DeepLinkState::Pending;
            return &self.state;
        }
        if jump(&target, nav, doc) {
            self.state = DeepLinkState::Done(DeepLinkOutcome::Jumped(target));
        } else {
            tracing::debug!(section = %target, timeout_ms = self.timeout.as_millis(), "waiting for deep link target");
            self.state = DeepLinkState::Watching {
                deadline: now + self.timeout,
            };
        }
        &self.state
    }

    /// Retry after a structural mutation
    pub fn on_mutation(&mut self, nav: &mut NavigationSynchronizer, doc: &dyn Document) -> &DeepLinkState {
        if !self.is_watching() {
            return &self.state;
        }
        if let Some(target) = self.target.clone() {
            if jump(&target, nav, doc) {
                self.state = DeepLinkState::Done(DeepLinkOutcome::Jumped(target));
            }
        }
        &self.state
    }

    /// Deadline reached: stop watching and make one final attempt
    pub fn on_deadline(&mut self, nav: &mut NavigationSynchronizer, doc: &dyn Document) -> &DeepLinkState {
        if !self.is_watching() {
            return &self.state;
        }
        if let Some(target) = self.target.clone() {
            let outcome = if jump(&target, nav, doc) {
                DeepLinkOutcome::Jumped(target)
            } else {
                tracing::info!(section = %target, "deep link target never mounted");
                DeepLinkOutcome::Abandoned(target)
            };
            self.state = DeepLinkState::Done(outcome);
        }
        &self.state
    }

    /// Detach any watch without consuming the one-shot
    pub fn teardown(&mut self) {
        if self.is_watching() {
            self.state = DeepLinkState::Pending;
        }
    }
}

/// Scroll to `target` without animation if it is mounted
fn jump(target: &SectionId, nav: &mut NavigationSynchronizer, doc: &dyn Document) -> bool {
    if doc.offset_top(target).is_none() {
        return false;
    }
    let previous = doc.scroll_behavior();
    doc.set_scroll_behavior(ScrollBehavior::Instant);
    doc.scroll_into_view(target);
    doc.set_scroll_behavior(match previous {
        ScrollBehavior::Unset => ScrollBehavior::Smooth,
        other => other,
    });
    nav.force_active(target.clone(), doc);
    tracing::info!(section = %target, "jumped to deep link target");
    true
}
