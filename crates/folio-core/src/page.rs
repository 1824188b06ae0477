//! Page orchestrator
//!
//! Owns every piece of page state and runs a single event loop:
//!
//! ```text
//!            ┌── boot timer (delay + fonts) ──┐
//! host ──→ PageEvent ──┐                      │
//! data ──→ DataSnapshot┼──→ Page::run ────────┴──→ watch<PageView>
//! deep-link deadline ──┘
//! ```
//!
//! All mutations happen on the loop task, so the synchronizer, resolver,
//! gate and loader need no locking of their own.

use crate::boot::{boot_timer, BootState, FontReady, ReadinessGate};
use crate::config::PageConfig;
use crate::deep_link::{DeepLinkResolver, DeepLinkState};
use crate::document::Document;
use crate::error::FolioResult;
use crate::loader::{LoaderEvent, LoaderProps, LoaderState, VeilStyle};
use crate::navigation::{NavigationSynchronizer, Trigger};
use crate::section::{nav_candidates, NavCandidate, SectionId};
use folio_cache::{SessionStorage, SystemClock};
use folio_data::{DataAcquisition, DataSnapshot, HttpFetcher, Latch};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// Host event delivered to the page
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Window scrolled
    Scroll,
    /// Requested animation frame fired
    AnimationFrame,
    /// Viewport resized
    Resize,
    /// Structural change under the page body
    Mutation,
    /// Loader progress or completion
    Loader(LoaderEvent),
    /// Navigation entry clicked
    Select(SectionId),
    /// Fetch the content document again
    Reload,
    /// Page is going away
    Teardown,
}

/// Everything the host renders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageView {
    /// Highlighted navigation entry
    pub active: Option<SectionId>,
    /// Enabled navigation entries in page order
    pub nav: Vec<NavCandidate>,
    /// Whether the host should deliver an animation frame
    pub frame_requested: bool,
    /// Deep-link resolution state
    pub deep_link: DeepLinkState,
    /// Boot phase
    pub boot: BootState,
    /// Foreground data load in flight
    pub loading: bool,
    /// Data advisory
    pub error: Option<String>,
    /// Loader props
    pub loader: LoaderProps,
    /// Content veil; `None` when the loader is hidden
    pub veil: Option<VeilStyle>,
    /// Content fully revealed; terminal
    pub revealed: bool,
}

/// Content document acquisition over HTTP for `config`
///
/// # Errors
///
/// Fails if the HTTP client cannot be built.
pub fn http_data_acquisition(
    config: &PageConfig,
    storage: Arc<dyn SessionStorage>,
) -> FolioResult<DataAcquisition> {
    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout())?);
    let cache = config.data_cache(storage, Arc::new(SystemClock));
    Ok(DataAcquisition::new(fetcher, cache, config.data_url()))
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Client-side page orchestrator
pub struct Page {
    config: PageConfig,
    doc: Arc<dyn Document>,
    data: DataAcquisition,
    snapshot: DataSnapshot,
    nav: NavigationSynchronizer,
    deep_link: DeepLinkResolver,
    gate: ReadinessGate,
    loader: LoaderState,
    revealed: Latch,
    view: watch::Sender<PageView>,
}

impl Page {
    /// Create page; the URL fragment is read once, here
    #[must_use]
    pub fn new(config: PageConfig, doc: Arc<dyn Document>, data: DataAcquisition) -> Self {
        let fragment = doc.fragment();
        let snapshot = data.snapshot();
        let nav = NavigationSynchronizer::new(
            nav_candidates(&snapshot.payload),
            &fragment,
            config.pivot_fraction,
        )
        .with_fragment_sync(config.sync_fragment);
        let deep_link = DeepLinkResolver::new(&fragment, config.deep_link_timeout());
        let (view, _) = watch::channel(PageView::default());

        let page = Self {
            config,
            doc,
            data,
            snapshot,
            nav,
            deep_link,
            gate: ReadinessGate::new(),
            loader: LoaderState::new(),
            revealed: Latch::new(),
            view,
        };
        page.view.send_replace(page.render());
        page
    }

    /// Watch the rendered view
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PageView> {
        self.view.subscribe()
    }

    /// Current view
    #[inline]
    #[must_use]
    pub fn view(&self) -> PageView {
        self.view.borrow().clone()
    }

    /// Run until [`PageEvent::Teardown`] or the event channel closes
    ///
    /// Returns the final view.
    pub async fn run(mut self, mut events: mpsc::Receiver<PageEvent>, fonts: FontReady) -> PageView {
        tracing::info!(url = %self.data.url(), "page mounted");
        self.nav.attach(self.doc.as_ref());

        let mut data_rx = self.data.subscribe();
        drop(self.data.activate(self.data.url()));
        self.snapshot = data_rx.borrow_and_update().clone();
        self.gate.set_data_loading(self.snapshot.loading);
        self.sync_candidates();
        self.nav.evaluate_now(self.doc.as_ref());
        self.deep_link
            .start(&mut self.nav, self.doc.as_ref(), Instant::now());
        self.publish();

        let boot = boot_timer(self.config.boot_delay(), fonts);
        tokio::pin!(boot);
        let mut booting = true;

        loop {
            let deadline = self.deep_link.deadline();
            tokio::select! {
                () = &mut boot, if booting => {
                    booting = false;
                    self.gate.mark_timer_elapsed();
                }
                changed = data_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = data_rx.borrow_and_update().clone();
                    self.apply_snapshot(snapshot);
                }
                () = deadline_elapsed(deadline), if deadline.is_some() => {
                    self.deep_link.on_deadline(&mut self.nav, self.doc.as_ref());
                }
                event = events.recv() => match event {
                    Some(PageEvent::Teardown) | None => break,
                    Some(event) => self.handle(event),
                },
            }
            self.publish();
        }

        self.teardown();
        self.publish();
        self.view()
    }

    fn handle(&mut self, event: PageEvent) {
        let doc = self.doc.as_ref();
        match event {
            PageEvent::Scroll => {
                self.nav.handle(Trigger::Scroll, doc);
            }
            PageEvent::AnimationFrame => {
                self.nav.handle(Trigger::AnimationFrame, doc);
            }
            PageEvent::Resize => {
                self.nav.handle(Trigger::Resize, doc);
            }
            PageEvent::Mutation => {
                self.deep_link.on_mutation(&mut self.nav, doc);
                self.nav.handle(Trigger::Mutation, doc);
            }
            PageEvent::Loader(event) => {
                self.loader.apply(event);
            }
            PageEvent::Select(id) => {
                self.nav.select(&id, doc);
            }
            PageEvent::Reload => {
                drop(self.data.reload());
            }
            PageEvent::Teardown => {}
        }
    }

    fn apply_snapshot(&mut self, snapshot: DataSnapshot) {
        if let Some(error) = &snapshot.error {
            if self.snapshot.error.as_ref() != Some(error) {
                tracing::warn!(error = %error, "showing fallback content");
            }
        }
        self.snapshot = snapshot;
        self.gate.set_data_loading(self.snapshot.loading);
        if self.sync_candidates() {
            self.deep_link
                .start(&mut self.nav, self.doc.as_ref(), Instant::now());
        }
    }

    /// Re-derive candidates from the payload; returns whether they changed
    fn sync_candidates(&mut self) -> bool {
        let candidates = nav_candidates(&self.snapshot.payload);
        if candidates == self.nav.candidates() {
            return false;
        }
        self.nav.set_candidates(candidates, self.doc.as_ref());
        true
    }

    fn teardown(&mut self) {
        self.nav.detach(self.doc.as_ref());
        self.deep_link.teardown();
        self.data.unmount();
        tracing::info!("page torn down");
    }

    fn render(&self) -> PageView {
        let payload = &self.snapshot.payload;
        let show = self.loader.show(payload);
        PageView {
            active: self.nav.active().cloned(),
            nav: self.nav.enabled().cloned().collect(),
            frame_requested: self.nav.frame_pending(),
            deep_link: self.deep_link.state().clone(),
            boot: self.gate.state(),
            loading: self.snapshot.loading,
            error: self.snapshot.error.clone(),
            loader: self.loader.props(
                payload,
                self.gate.can_finish(),
                self.snapshot.loading,
                self.config.loader_min_duration(),
            ),
            veil: show.then(|| self.loader.veil(payload)),
            revealed: self.revealed.is_done(),
        }
    }

    fn publish(&mut self) {
        let show = self.loader.show(&self.snapshot.payload);
        if !show && self.gate.can_finish() && self.revealed.trip() {
            tracing::info!("content revealed");
        }
        let next = self.render();
        self.view.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("data", &self.data)
            .field("nav", &self.nav)
            .field("deep_link", &self.deep_link)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
